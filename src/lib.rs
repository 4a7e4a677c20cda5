#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Conductor Core
//!
//! High-performance Rust core for declarative workflow orchestration.
//!
//! ## Overview
//!
//! Conductor executes declaratively-defined workflows: directed task graphs
//! whose edges are inferred from references one task makes to another
//! task's output (`{{tasks.fetch.output.body}}`). This crate is the
//! orchestration core behind the HTTP/CLI gateways: it turns a loosely
//! structured task list into a validated, schedulable execution plan, runs
//! that plan with correct concurrency and failure semantics, and analyzes
//! the blast radius of task changes.
//!
//! ## Module Organization
//!
//! - [`models`] - Workflow definitions, execution records, usage edges
//! - [`orchestration`] - Graph construction, execution, blast radius
//! - [`events`] - Lifecycle event publishing
//! - [`config`] - YAML-driven configuration with environment overlays
//! - [`constants`] - Status enums and system constants
//! - [`error`] - Unified error surface
//! - [`logging`] - Structured logging bootstrap
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::{json, Value};
//! use conductor_core::models::{TaskSpec, WorkflowDefinition};
//! use conductor_core::orchestration::{
//!     self, InMemoryExecutionRecorder, TaskExecutor, TaskInvocation, WorkflowOrchestrator,
//! };
//!
//! struct EchoExecutor;
//!
//! #[async_trait]
//! impl TaskExecutor for EchoExecutor {
//!     async fn invoke(&self, task_ref: &str, input: Value) -> TaskInvocation {
//!         TaskInvocation::succeeded(json!({ "ref": task_ref, "input": input }))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let workflow = WorkflowDefinition::new(
//!     "greet",
//!     vec![
//!         TaskSpec::new("hello", "echo").with_input("who", "{{input.name}}"),
//!         TaskSpec::new("reply", "echo").with_input("to", "{{tasks.hello.output}}"),
//!     ],
//! );
//!
//! // Build: validates references, rejects cycles, computes parallel groups
//! let graph = orchestration::build(&workflow).map_err(|errors| {
//!     format!("invalid workflow: {errors:?}")
//! })?;
//! assert_eq!(graph.groups().len(), 2);
//!
//! // Execute: groups in dependency order, tasks within a group concurrently
//! let orchestrator = WorkflowOrchestrator::new(
//!     Arc::new(EchoExecutor),
//!     Arc::new(InMemoryExecutionRecorder::new()),
//! );
//! let record = orchestrator
//!     .execute(&graph, &workflow, json!({ "name": "world" }))
//!     .await?;
//! assert!(record.status.is_terminal());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;

pub use config::{BlastRadiusConfig, ConductorConfig, EventConfig, ExecutionConfig};
pub use constants::{ExecutionStatus, TaskStatus};
pub use error::{ConductorError, Result};
pub use models::{ExecutionRecord, TaskExecutionRecord, TaskSpec, UsageEdge, WorkflowDefinition};
pub use orchestration::{
    build, validate_workflow, AdmissionDecision, BlastRadiusAnalyzer, BlastRadiusReport,
    ExecutionGraph, ExecutionGroup, ExecutionRecorder, InMemoryExecutionRecorder,
    InMemoryTaskUsageIndex, OrchestratorConfig, ReportFormat, TaskExecutor, TaskInvocation,
    TaskUsageIndex, TraversalDepth, ValidationError, WorkflowOrchestrator,
};
