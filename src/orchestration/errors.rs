//! # Orchestration Error Types
//!
//! Structured error handling for graph construction and workflow execution
//! using thiserror instead of `Box<dyn Error>` patterns.
//!
//! Two families: [`ValidationError`] for structural problems found while
//! building an execution graph (collected, surfaced to admission callers
//! before any execution), and [`OrchestrationError`] for failures of the
//! execution machinery itself. A dispatched task's own failure is neither --
//! it is a captured outcome on the task's execution record.

use thiserror::Error;

/// Structural validation error raised while building an execution graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task '{task_id}' references unknown task '{missing}'")]
    MissingTaskReference { task_id: String, missing: String },

    #[error("Circular dependency: {}", format_cycle(.cycle))]
    CircularDependency { cycle: Vec<String> },

    #[error("Task '{task_id}' input '{field}' has malformed template syntax: {reason}")]
    MalformedTemplate {
        task_id: String,
        field: String,
        reason: String,
    },

    #[error("Duplicate task id '{task_id}'")]
    DuplicateTaskId { task_id: String },

    #[error("Task at position {position} has an empty id")]
    EmptyTaskId { position: usize },
}

impl ValidationError {
    /// Create a missing-reference error
    pub fn missing_reference(task_id: impl Into<String>, missing: impl Into<String>) -> Self {
        Self::MissingTaskReference {
            task_id: task_id.into(),
            missing: missing.into(),
        }
    }

    /// Create a cycle error from the traversal path
    pub fn circular_dependency(cycle: Vec<String>) -> Self {
        Self::CircularDependency { cycle }
    }

    /// Create a malformed-template error
    pub fn malformed_template(
        task_id: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedTemplate {
            task_id: task_id.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

fn format_cycle(cycle: &[String]) -> String {
    cycle.join(" -> ")
}

/// Failure of the orchestration machinery during workflow execution
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// A template resolved to a dependency whose output is not in context.
    /// Unreachable for a validated graph; indicates a graph-construction bug.
    #[error(
        "Internal consistency error: task '{task_id}' requires output of '{dependency}' which is not in context"
    )]
    MissingDependencyOutput { task_id: String, dependency: String },

    #[error("Input reference '{reference}' in task '{task_id}' cannot be resolved: {reason}")]
    UnresolvableReference {
        task_id: String,
        reference: String,
        reason: String,
    },

    /// The execution graph names a task the workflow definition lacks.
    /// Unreachable when the graph was built from the same definition.
    #[error("Internal consistency error: graph task '{task_id}' is not in the workflow definition")]
    UnknownGraphTask { task_id: String },

    #[error("Execution record persistence failed: {message}")]
    RecorderFailure { message: String },

    #[error("Configuration error: {source_name}: {reason}")]
    ConfigurationError { source_name: String, reason: String },

    #[error("Execution '{execution_id}' not found")]
    ExecutionNotFound { execution_id: uuid::Uuid },

    #[error("Event publishing failed: {0}")]
    EventPublish(#[from] crate::events::PublishError),
}

impl OrchestrationError {
    /// Create an internal-consistency error for a missing dependency output
    pub fn missing_dependency_output(
        task_id: impl Into<String>,
        dependency: impl Into<String>,
    ) -> Self {
        Self::MissingDependencyOutput {
            task_id: task_id.into(),
            dependency: dependency.into(),
        }
    }

    /// Create a recorder failure
    pub fn recorder_failure(message: impl Into<String>) -> Self {
        Self::RecorderFailure {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigurationError {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for graph construction
pub type BuildResult<T> = Result<T, Vec<ValidationError>>;

/// Result type alias for orchestration operations
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_includes_full_path() {
        let err = ValidationError::circular_dependency(vec![
            "a".to_string(),
            "b".to_string(),
            "a".to_string(),
        ]);
        assert_eq!(err.to_string(), "Circular dependency: a -> b -> a");
    }

    #[test]
    fn test_missing_reference_display() {
        let err = ValidationError::missing_reference("transform", "fetch");
        assert!(err.to_string().contains("transform"));
        assert!(err.to_string().contains("fetch"));
    }

    #[test]
    fn test_internal_consistency_error_names_both_tasks() {
        let err = OrchestrationError::missing_dependency_output("b", "a");
        let msg = err.to_string();
        assert!(msg.contains("Internal consistency"));
        assert!(msg.contains("'b'"));
        assert!(msg.contains("'a'"));
    }
}
