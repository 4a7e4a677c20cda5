//! Usage-edge model backing blast radius analysis.

use serde::{Deserialize, Serialize};

/// A single usage relation: `workflow_name` references `task_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageEdge {
    pub task_name: String,
    pub workflow_name: String,
}

impl UsageEdge {
    pub fn new(task_name: impl Into<String>, workflow_name: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            workflow_name: workflow_name.into(),
        }
    }
}
