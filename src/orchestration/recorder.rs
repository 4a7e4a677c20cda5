//! # Execution Recorder Collaborator
//!
//! Durable persistence of execution records lives outside the core. The
//! orchestrator hands finished (and in some deployments, in-flight) records
//! to this trait; the read side backs reporting features such as execution
//! listings and duration statistics.
//!
//! [`InMemoryExecutionRecorder`] is the reference implementation, used in
//! tests and in single-process deployments without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::ExecutionStatus;
use crate::models::execution::ExecutionRecord;
use crate::orchestration::errors::{OrchestrationError, OrchestrationResult};

/// Aggregate statistics over historical execution durations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStatistics {
    pub workflow_name: Option<String>,
    pub total_executions: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub running: usize,
    pub avg_duration_ms: Option<u64>,
    pub p50_duration_ms: Option<u64>,
    pub p90_duration_ms: Option<u64>,
    pub p99_duration_ms: Option<u64>,
}

/// Persists and queries execution records
#[async_trait]
pub trait ExecutionRecorder: Send + Sync {
    /// Persist one record (insert or overwrite by execution id)
    async fn save(&self, record: &ExecutionRecord) -> OrchestrationResult<()>;

    /// All records, newest first
    async fn list(&self) -> OrchestrationResult<Vec<ExecutionRecord>>;

    /// One record by execution id
    async fn get(&self, execution_id: Uuid) -> OrchestrationResult<ExecutionRecord>;

    /// Aggregate statistics, optionally restricted to one workflow
    async fn statistics(
        &self,
        workflow_name: Option<&str>,
    ) -> OrchestrationResult<ExecutionStatistics>;
}

/// In-memory recorder backed by a read-write lock over a map
#[derive(Debug, Default)]
pub struct InMemoryExecutionRecorder {
    records: RwLock<HashMap<Uuid, ExecutionRecord>>,
}

impl InMemoryExecutionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl ExecutionRecorder for InMemoryExecutionRecorder {
    async fn save(&self, record: &ExecutionRecord) -> OrchestrationResult<()> {
        self.records
            .write()
            .insert(record.execution_id, record.clone());
        Ok(())
    }

    async fn list(&self) -> OrchestrationResult<Vec<ExecutionRecord>> {
        let mut records: Vec<ExecutionRecord> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(records)
    }

    async fn get(&self, execution_id: Uuid) -> OrchestrationResult<ExecutionRecord> {
        self.records
            .read()
            .get(&execution_id)
            .cloned()
            .ok_or(OrchestrationError::ExecutionNotFound { execution_id })
    }

    async fn statistics(
        &self,
        workflow_name: Option<&str>,
    ) -> OrchestrationResult<ExecutionStatistics> {
        let records = self.records.read();
        let matching: Vec<&ExecutionRecord> = records
            .values()
            .filter(|r| workflow_name.is_none_or(|name| r.workflow_name == name))
            .collect();

        let succeeded = matching
            .iter()
            .filter(|r| r.status == ExecutionStatus::Succeeded)
            .count();
        let failed = matching
            .iter()
            .filter(|r| r.status == ExecutionStatus::Failed)
            .count();
        let running = matching
            .iter()
            .filter(|r| r.status == ExecutionStatus::Running)
            .count();

        let mut durations: Vec<u64> = matching.iter().filter_map(|r| r.duration_ms).collect();
        durations.sort_unstable();

        let avg = (!durations.is_empty())
            .then(|| durations.iter().sum::<u64>() / durations.len() as u64);

        Ok(ExecutionStatistics {
            workflow_name: workflow_name.map(String::from),
            total_executions: matching.len(),
            succeeded,
            failed,
            running,
            avg_duration_ms: avg,
            p50_duration_ms: percentile(&durations, 50),
            p90_duration_ms: percentile(&durations, 90),
            p99_duration_ms: percentile(&durations, 99),
        })
    }
}

/// Nearest-rank percentile over a sorted slice
fn percentile(sorted: &[u64], pct: u32) -> Option<u64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (pct as f64 / 100.0 * sorted.len() as f64).ceil() as usize;
    Some(sorted[rank.clamp(1, sorted.len()) - 1])
}
