//! # Orchestration Types
//!
//! Shared types used across graph construction and workflow execution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::TaskStatus;

/// A completed task's output and terminal status, as visible to template
/// resolution in later groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub status: TaskStatus,
    pub value: Value,
}

/// Mutable state scoped to a single workflow execution.
///
/// Written only by the orchestrator's own execution loop; never shared
/// across concurrent executions, so no locking is required.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Workflow-level input values, set once at execution start
    input: Value,
    /// Task id to output, populated as groups complete
    task_outputs: HashMap<String, TaskOutput>,
}

impl ExecutionContext {
    pub fn new(input: Value) -> Self {
        Self {
            input,
            task_outputs: HashMap::new(),
        }
    }

    pub fn input(&self) -> &Value {
        &self.input
    }

    /// Record a completed task's output
    pub fn insert_output(&mut self, task_id: impl Into<String>, output: TaskOutput) {
        self.task_outputs.insert(task_id.into(), output);
    }

    /// Output of an already-completed task, if present
    pub fn output_of(&self, task_id: &str) -> Option<&TaskOutput> {
        self.task_outputs.get(task_id)
    }

    /// Number of completed tasks visible in this context
    pub fn completed_count(&self) -> usize {
        self.task_outputs.len()
    }
}

/// Outcome of one task invocation, as returned by the Task Executor
/// collaborator. A failed invocation is data, not an error: the orchestrator
/// records it and decides group advancement from recorded status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInvocation {
    pub status: TaskStatus,
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskInvocation {
    /// A successful invocation carrying an output value
    pub fn succeeded(output: Value) -> Self {
        Self {
            status: TaskStatus::Succeeded,
            output,
            error: None,
        }
    }

    /// A failed invocation carrying an error payload
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            output: Value::Null,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_output_visibility() {
        let mut ctx = ExecutionContext::new(json!({"region": "us-east-1"}));
        assert!(ctx.output_of("fetch").is_none());

        ctx.insert_output(
            "fetch",
            TaskOutput {
                status: TaskStatus::Succeeded,
                value: json!({"body": "ok"}),
            },
        );

        let output = ctx.output_of("fetch").unwrap();
        assert_eq!(output.value["body"], "ok");
        assert_eq!(ctx.completed_count(), 1);
    }

    #[test]
    fn test_invocation_constructors() {
        assert!(TaskInvocation::succeeded(json!(1)).is_success());
        let failed = TaskInvocation::failed("boom");
        assert!(!failed.is_success());
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }
}
