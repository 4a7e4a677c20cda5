//! # Orchestration Engine
//!
//! The core of the crate: turning declaratively-defined workflows into
//! validated execution plans and running those plans with correct
//! concurrency and failure semantics.
//!
//! ## Core Components
//!
//! - **graph_builder**: extracts task dependencies, detects cycles, and
//!   computes the minimum-depth parallel schedule
//! - **WorkflowOrchestrator**: executes the schedule group by group,
//!   resolving task inputs against accumulated state and delegating
//!   invocation to the external Task Executor
//! - **BlastRadiusAnalyzer**: bounded BFS over the usage graph reporting
//!   the transitive set of affected workflows and tasks
//! - **template**: reference extraction and resolution shared by the
//!   builder and the orchestrator
//! - **admission**: the synchronous validation gate called before a
//!   definition is persisted
//!
//! Collaborators the core depends on but does not implement: the Task
//! Executor (side effects), the Execution Recorder (persistence), and the
//! Task Usage Index (usage relationships). In-memory reference
//! implementations ship for the latter two.

pub mod admission;
pub mod blast_radius;
pub mod errors;
pub mod graph_builder;
pub mod recorder;
pub mod task_executor;
pub mod template;
pub mod types;
pub mod workflow_orchestrator;

// Re-export core types and components for easy access
pub use admission::{validate_workflow, AdmissionDecision};
pub use blast_radius::{
    BlastRadiusAnalyzer, BlastRadiusReport, DepthLevel, InMemoryTaskUsageIndex, ReportFormat,
    TaskUsageIndex, TraversalDepth,
};
pub use errors::{BuildResult, OrchestrationError, OrchestrationResult, ValidationError};
pub use graph_builder::{build, ExecutionGraph, ExecutionGroup};
pub use recorder::{ExecutionRecorder, ExecutionStatistics, InMemoryExecutionRecorder};
pub use task_executor::TaskExecutor;
pub use template::{extract_references, ExtractedRefs, Reference};
pub use types::{ExecutionContext, TaskInvocation, TaskOutput};
pub use workflow_orchestrator::{OrchestratorConfig, WorkflowOrchestrator};
