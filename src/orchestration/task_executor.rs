//! # Task Executor Collaborator
//!
//! The orchestration core never issues task side effects itself. Dispatch is
//! delegated to an external executor (HTTP call, transform engine, shell
//! step) behind this trait; the core treats it as an opaque asynchronous
//! call returning a captured outcome.

use async_trait::async_trait;
use serde_json::Value;

use crate::orchestration::types::TaskInvocation;

/// Issues the actual task side effect for one resolved invocation.
///
/// Implementations must capture task-level failure inside the returned
/// [`TaskInvocation`] rather than panicking: the orchestrator decides group
/// advancement from recorded status, not from unwound errors.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Invoke the task type named by `task_ref` with fully resolved input
    async fn invoke(&self, task_ref: &str, resolved_input: Value) -> TaskInvocation;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoExecutor;

    #[async_trait]
    impl TaskExecutor for EchoExecutor {
        async fn invoke(&self, task_ref: &str, resolved_input: Value) -> TaskInvocation {
            TaskInvocation::succeeded(json!({
                "task_ref": task_ref,
                "input": resolved_input,
            }))
        }
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let executor: std::sync::Arc<dyn TaskExecutor> = std::sync::Arc::new(EchoExecutor);
        let outcome = executor.invoke("http", json!({"url": "x"})).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.output["task_ref"], "http");
    }
}
