//! Workflow fixtures shared across integration tests.

use conductor_core::models::{TaskSpec, WorkflowDefinition};

/// Helper: a task that references the outputs of the given dependencies
pub fn task_with_refs(id: &str, task_ref: &str, deps: &[&str]) -> TaskSpec {
    let mut task = TaskSpec::new(id, task_ref);
    for (i, dep) in deps.iter().enumerate() {
        task = task.with_input(
            format!("arg{i}"),
            format!("{{{{tasks.{dep}.output}}}}"),
        );
    }
    task
}

/// `a -> {b, c}`: one root feeding a two-task fan-out
pub fn fan_out_workflow() -> WorkflowDefinition {
    WorkflowDefinition::new(
        "fan-out",
        vec![
            task_with_refs("a", "a-ref", &[]),
            task_with_refs("b", "b-ref", &["a"]),
            task_with_refs("c", "c-ref", &["a"]),
        ],
    )
}

/// `a -> {b, c} -> d`: diamond with a join
pub fn diamond_workflow() -> WorkflowDefinition {
    WorkflowDefinition::new(
        "diamond",
        vec![
            task_with_refs("a", "a-ref", &[]),
            task_with_refs("b", "b-ref", &["a"]),
            task_with_refs("c", "c-ref", &["a"]),
            task_with_refs("d", "d-ref", &["b", "c"]),
        ],
    )
}
