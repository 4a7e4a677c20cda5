//! # Execution Records
//!
//! The persisted outcome of one workflow execution. The orchestrator
//! constructs and mutates these; the external Execution Recorder persists
//! them. The orchestrator never depends on storage specifics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ExecutionStatus, TaskStatus};

/// Outcome of one executed task within a workflow execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExecutionRecord {
    pub task_id: String,
    pub task_ref: String,
    pub status: TaskStatus,
    /// Output value for succeeded tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// Error payload for failed tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl TaskExecutionRecord {
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }

    pub fn is_failure(&self) -> bool {
        self.status == TaskStatus::Failed
    }
}

/// The persisted outcome of one workflow execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub execution_id: Uuid,
    pub workflow_name: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Total wall-clock duration; set at finalization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// One record per executed task, in completion-recording order
    pub task_records: Vec<TaskExecutionRecord>,
}

impl ExecutionRecord {
    /// Create a fresh record in `Running` state
    pub fn started(workflow_name: impl Into<String>) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            workflow_name: workflow_name.into(),
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
            task_records: Vec::new(),
        }
    }

    /// Append a task outcome
    pub fn record_task(&mut self, record: TaskExecutionRecord) {
        self.task_records.push(record);
    }

    /// Finalize with a terminal status and total duration
    pub fn finalize(&mut self, status: ExecutionStatus) {
        debug_assert!(status.is_terminal());
        let completed_at = Utc::now();
        self.duration_ms = Some(
            (completed_at - self.started_at)
                .num_milliseconds()
                .max(0) as u64,
        );
        self.completed_at = Some(completed_at);
        self.status = status;
    }

    /// Look up the record for one task
    pub fn task_record(&self, task_id: &str) -> Option<&TaskExecutionRecord> {
        self.task_records.iter().find(|r| r.task_id == task_id)
    }

    /// Ids of tasks that failed
    pub fn failed_task_ids(&self) -> Vec<&str> {
        self.task_records
            .iter()
            .filter(|r| r.is_failure())
            .map(|r| r.task_id.as_str())
            .collect()
    }
}
