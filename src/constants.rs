//! # System Constants
//!
//! Core constants and status enums that define the operational boundaries of
//! the workflow orchestration core.

use serde::{Deserialize, Serialize};

/// Lifecycle event names published by the orchestrator
pub mod events {
    // Workflow lifecycle events
    pub const WORKFLOW_EXECUTION_STARTED: &str = "workflow.execution_started";
    pub const WORKFLOW_EXECUTION_COMPLETED: &str = "workflow.execution_completed";
    pub const WORKFLOW_EXECUTION_FAILED: &str = "workflow.execution_failed";
    pub const WORKFLOW_GROUP_STARTED: &str = "workflow.group_started";
    pub const WORKFLOW_GROUP_COMPLETED: &str = "workflow.group_completed";

    // Task lifecycle events
    pub const TASK_DISPATCHED: &str = "task.dispatched";
    pub const TASK_COMPLETED: &str = "task.completed";
    pub const TASK_FAILED: &str = "task.failed";

    // Analysis events
    pub const BLAST_RADIUS_COMPUTED: &str = "analysis.blast_radius_computed";
}

/// Overall status of one workflow execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Succeeded,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Succeeded => "succeeded",
            ExecutionStatus::Failed => "failed",
        }
    }

    /// Whether this status is terminal (no further transitions)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal status of one task within an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System-wide constants
pub mod system {
    /// Template namespace for task output references
    pub const TASKS_NAMESPACE: &str = "tasks";

    /// Template namespace for workflow input references
    pub const INPUT_NAMESPACE: &str = "input";

    /// Segment that selects a task's output in a reference path
    pub const OUTPUT_SEGMENT: &str = "output";

    /// Default broadcast channel capacity for lifecycle events
    pub const DEFAULT_EVENT_CAPACITY: usize = 1000;
}
