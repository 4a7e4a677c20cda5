//! Broadcast-based publisher for orchestration lifecycle events.
//!
//! Subscribers are optional: publishing with no receivers is not an error,
//! the event is simply dropped.

use serde_json::{json, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::constants::events;

/// High-throughput event publisher for lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event with the given name and context
    pub async fn publish(
        &self,
        event_name: impl Into<String>,
        context: Value,
    ) -> Result<(), PublishError> {
        let event = PublishedEvent {
            name: event_name.into(),
            context,
            published_at: chrono::Utc::now(),
        };

        // send() errors only when there are no subscribers, which is fine here
        match self.sender.send(event) {
            Ok(_) => Ok(()),
            Err(broadcast::error::SendError(_)) => Ok(()),
        }
    }

    /// Publish the start of a workflow execution
    pub async fn publish_execution_started(
        &self,
        execution_id: Uuid,
        workflow_name: &str,
        group_count: usize,
    ) -> Result<(), PublishError> {
        self.publish(
            events::WORKFLOW_EXECUTION_STARTED,
            json!({
                "execution_id": execution_id,
                "workflow_name": workflow_name,
                "group_count": group_count,
            }),
        )
        .await
    }

    /// Publish the terminal outcome of a workflow execution
    pub async fn publish_execution_completed(
        &self,
        execution_id: Uuid,
        workflow_name: &str,
        status: crate::constants::ExecutionStatus,
        duration_ms: u64,
    ) -> Result<(), PublishError> {
        let name = match status {
            crate::constants::ExecutionStatus::Failed => events::WORKFLOW_EXECUTION_FAILED,
            _ => events::WORKFLOW_EXECUTION_COMPLETED,
        };
        self.publish(
            name,
            json!({
                "execution_id": execution_id,
                "workflow_name": workflow_name,
                "status": status,
                "duration_ms": duration_ms,
            }),
        )
        .await
    }

    /// Publish a task's terminal outcome within an execution
    pub async fn publish_task_completed(
        &self,
        execution_id: Uuid,
        task_id: &str,
        status: crate::constants::TaskStatus,
        duration_ms: u64,
    ) -> Result<(), PublishError> {
        let name = match status {
            crate::constants::TaskStatus::Failed => events::TASK_FAILED,
            _ => events::TASK_COMPLETED,
        };
        self.publish(
            name,
            json!({
                "execution_id": execution_id,
                "task_id": task_id,
                "status": status,
                "duration_ms": duration_ms,
            }),
        )
        .await
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Event channel is closed")]
    ChannelClosed,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(crate::constants::system::DEFAULT_EVENT_CAPACITY)
    }
}
