//! # Execution Graph Builder
//!
//! Turns a workflow definition into a validated, acyclic execution graph
//! with tasks assigned to ordered parallel groups.
//!
//! Construction is a pure function from definition to graph: the graph is
//! rebuilt from scratch on every call and never cached, so concurrent
//! definition updates can never race a stale plan. Validation errors are
//! collected rather than failing on the first problem: all missing
//! references are reported, plus the first cycle found.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::workflow::WorkflowDefinition;
use crate::orchestration::errors::{BuildResult, ValidationError};
use crate::orchestration::template;

/// A set of tasks safe to run concurrently because all their dependencies
/// are satisfied by strictly earlier groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionGroup {
    /// Member task ids, lexicographically ordered for reproducible scheduling
    pub tasks: Vec<String>,
}

/// Validated, acyclic dependency graph with a parallel execution schedule.
///
/// Immutable once built; safe for concurrent readers. Built fresh for every
/// execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionGraph {
    /// Task id to the set of task ids it depends on (inferred and explicit)
    dependencies: BTreeMap<String, BTreeSet<String>>,
    /// Ordered parallel groups; a task's group index is the minimum index
    /// strictly greater than all of its dependencies' indices
    groups: Vec<ExecutionGroup>,
}

impl ExecutionGraph {
    pub fn dependencies(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.dependencies
    }

    /// Dependencies of one task; empty set for unknown ids
    pub fn dependencies_of(&self, task_id: &str) -> Option<&BTreeSet<String>> {
        self.dependencies.get(task_id)
    }

    pub fn groups(&self) -> &[ExecutionGroup] {
        &self.groups
    }

    /// Index of the group containing the given task
    pub fn group_index_of(&self, task_id: &str) -> Option<usize> {
        self.groups
            .iter()
            .position(|g| g.tasks.iter().any(|t| t == task_id))
    }

    pub fn task_count(&self) -> usize {
        self.dependencies.len()
    }
}

/// Build an execution graph from a workflow definition.
///
/// Returns the accumulated validation errors and no usable graph if any
/// structural problem exists: duplicate or empty task ids, malformed
/// template syntax, references to unknown tasks, or a dependency cycle.
pub fn build(workflow: &WorkflowDefinition) -> BuildResult<ExecutionGraph> {
    let mut errors = Vec::new();

    validate_shape(workflow, &mut errors);

    let known_ids: HashSet<&str> = workflow.tasks.iter().map(|t| t.id.as_str()).collect();
    let dependencies = collect_dependencies(workflow, &mut errors);

    // Referential validity: every dependency must name a task in the
    // workflow. Fail closed -- the edge is reported, never dropped silently.
    for (task_id, deps) in &dependencies {
        for dep in deps {
            if !known_ids.contains(dep.as_str()) {
                errors.push(ValidationError::missing_reference(task_id, dep));
            }
        }
    }

    // Cycle detection runs on the edges whose endpoints exist, so one pass
    // can report missing references and a cycle together.
    if let Some(cycle) = find_cycle(&dependencies, &known_ids) {
        errors.push(ValidationError::circular_dependency(cycle));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let groups = layer_groups(&dependencies);

    debug!(
        workflow = %workflow.name,
        tasks = dependencies.len(),
        groups = groups.len(),
        "Built execution graph"
    );

    Ok(ExecutionGraph {
        dependencies,
        groups,
    })
}

/// Duplicate and empty task ids are structural errors
fn validate_shape(workflow: &WorkflowDefinition, errors: &mut Vec<ValidationError>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for (position, task) in workflow.tasks.iter().enumerate() {
        if task.id.is_empty() {
            errors.push(ValidationError::EmptyTaskId { position });
            continue;
        }
        if !seen.insert(task.id.as_str()) {
            errors.push(ValidationError::DuplicateTaskId {
                task_id: task.id.clone(),
            });
        }
    }
}

/// Union inferred references with explicit declarations, per task.
///
/// Malformed template syntax is collected but does not stop scanning of
/// sibling values or remaining tasks.
fn collect_dependencies(
    workflow: &WorkflowDefinition,
    errors: &mut Vec<ValidationError>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut dependencies: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for task in &workflow.tasks {
        let deps = dependencies.entry(task.id.clone()).or_default();
        deps.extend(task.depends_on.iter().cloned());

        for (field, value) in &task.input {
            let extracted = template::extract_references(value);
            for reason in extracted.errors {
                errors.push(ValidationError::malformed_template(&task.id, field, reason));
            }
            deps.extend(extracted.task_refs);
        }
    }

    dependencies
}

/// Depth-first cycle search over dependency edges.
///
/// Maintains an explicit recursion stack; the first time a node on the
/// current stack is revisited, the full cycle path is returned in traversal
/// order (`a -> b -> a`). Every node is visited at most once overall, so the
/// search is linear even though only the first cycle is reported.
fn find_cycle(
    dependencies: &BTreeMap<String, BTreeSet<String>>,
    known_ids: &HashSet<&str>,
) -> Option<Vec<String>> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();
    let mut on_stack: HashSet<&str> = HashSet::new();

    // BTreeMap iteration makes root order deterministic
    for root in dependencies.keys() {
        if visited.contains(root.as_str()) {
            continue;
        }
        if let Some(cycle) = visit(
            root.as_str(),
            dependencies,
            known_ids,
            &mut visited,
            &mut stack,
            &mut on_stack,
        ) {
            return Some(cycle);
        }
    }
    None
}

fn visit<'a>(
    node: &'a str,
    dependencies: &'a BTreeMap<String, BTreeSet<String>>,
    known_ids: &HashSet<&str>,
    visited: &mut HashSet<&'a str>,
    stack: &mut Vec<&'a str>,
    on_stack: &mut HashSet<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    stack.push(node);
    on_stack.insert(node);

    if let Some(deps) = dependencies.get(node) {
        for dep in deps {
            // Edges to unknown tasks are already reported as referential errors
            if !known_ids.contains(dep.as_str()) {
                continue;
            }
            if on_stack.contains(dep.as_str()) {
                let start = stack
                    .iter()
                    .position(|n| *n == dep.as_str())
                    .expect("node on stack");
                let mut cycle: Vec<String> =
                    stack[start..].iter().map(|s| s.to_string()).collect();
                cycle.push(dep.clone());
                return Some(cycle);
            }
            if !visited.contains(dep.as_str()) {
                if let Some(cycle) =
                    visit(dep.as_str(), dependencies, known_ids, visited, stack, on_stack)
                {
                    return Some(cycle);
                }
            }
        }
    }

    stack.pop();
    on_stack.remove(node);
    None
}

/// Breadth-first layering into the unique minimum-depth grouping.
///
/// Repeatedly selects the not-yet-assigned tasks whose dependencies are all
/// assigned to strictly earlier groups. Assumes an acyclic, referentially
/// closed dependency map.
fn layer_groups(dependencies: &BTreeMap<String, BTreeSet<String>>) -> Vec<ExecutionGroup> {
    let mut assigned: HashSet<String> = HashSet::new();
    let mut groups = Vec::new();

    while assigned.len() < dependencies.len() {
        // BTreeMap order keeps each group lexicographically sorted
        let ready: Vec<String> = dependencies
            .iter()
            .filter(|(id, deps)| {
                !assigned.contains(id.as_str())
                    && deps.iter().all(|d| assigned.contains(d.as_str()))
            })
            .map(|(id, _)| id.clone())
            .collect();

        // An empty ready set with unassigned tasks would mean a cycle, which
        // find_cycle has already ruled out
        debug_assert!(!ready.is_empty(), "layering stalled on an acyclic graph");
        if ready.is_empty() {
            break;
        }

        assigned.extend(ready.iter().cloned());
        groups.push(ExecutionGroup { tasks: ready });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workflow::TaskSpec;

    fn workflow(tasks: Vec<TaskSpec>) -> WorkflowDefinition {
        WorkflowDefinition::new("test-workflow", tasks)
    }

    #[test]
    fn test_fan_out_groups() {
        // A has no deps; B and C both reference A's output
        let wf = workflow(vec![
            TaskSpec::new("a", "noop"),
            TaskSpec::new("b", "noop").with_input("data", "{{tasks.a.output}}"),
            TaskSpec::new("c", "noop").with_input("data", "{{tasks.a.output}}"),
        ]);
        let graph = build(&wf).unwrap();

        assert_eq!(graph.groups().len(), 2);
        assert_eq!(graph.groups()[0].tasks, vec!["a"]);
        assert_eq!(graph.groups()[1].tasks, vec!["b", "c"]);
    }

    #[test]
    fn test_explicit_dependencies_are_unioned() {
        let wf = workflow(vec![
            TaskSpec::new("a", "noop"),
            TaskSpec::new("b", "noop"),
            TaskSpec::new("c", "noop")
                .with_input("data", "{{tasks.a.output}}")
                .with_dependency("b"),
        ]);
        let graph = build(&wf).unwrap();

        let deps = graph.dependencies_of("c").unwrap();
        assert!(deps.contains("a"));
        assert!(deps.contains("b"));
        assert_eq!(graph.group_index_of("c"), Some(1));
    }

    #[test]
    fn test_cycle_reported_with_full_path() {
        let wf = workflow(vec![
            TaskSpec::new("a", "noop").with_input("data", "{{tasks.c.output}}"),
            TaskSpec::new("b", "noop").with_input("data", "{{tasks.a.output}}"),
            TaskSpec::new("c", "noop").with_input("data", "{{tasks.b.output}}"),
        ]);
        let errors = build(&wf).unwrap_err();

        let cycle = errors
            .iter()
            .find_map(|e| match e {
                ValidationError::CircularDependency { cycle } => Some(cycle),
                _ => None,
            })
            .expect("cycle error");

        // Full path in traversal order, closed on the revisited node
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle.len(), 4);
        for id in ["a", "b", "c"] {
            assert!(cycle.contains(&id.to_string()));
        }
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let wf = workflow(vec![
            TaskSpec::new("a", "noop").with_input("data", "{{tasks.a.output}}")
        ]);
        let errors = build(&wf).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::CircularDependency { .. }
        ));
    }

    #[test]
    fn test_missing_reference_fails_closed() {
        let wf = workflow(vec![
            TaskSpec::new("a", "noop").with_input("data", "{{tasks.ghost.output}}")
        ]);
        let errors = build(&wf).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::missing_reference("a", "ghost")]
        );
    }

    #[test]
    fn test_all_missing_references_collected() {
        let wf = workflow(vec![
            TaskSpec::new("a", "noop")
                .with_input("x", "{{tasks.ghost1.output}}")
                .with_input("y", "{{tasks.ghost2.output}}"),
            TaskSpec::new("b", "noop").with_dependency("ghost3"),
        ]);
        let errors = build(&wf).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::MissingTaskReference { .. })));
    }

    #[test]
    fn test_malformed_template_collected_with_partial_extraction() {
        // One malformed value; sibling values still contribute edges
        let wf = workflow(vec![
            TaskSpec::new("a", "noop"),
            TaskSpec::new("b", "noop")
                .with_input("bad", "{{tasks.broken")
                .with_input("good", "{{tasks.a.output}}"),
        ]);
        let errors = build(&wf).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            ValidationError::MalformedTemplate { .. }
        ));
    }

    #[test]
    fn test_duplicate_task_id_rejected() {
        let wf = workflow(vec![TaskSpec::new("a", "noop"), TaskSpec::new("a", "noop")]);
        let errors = build(&wf).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateTaskId { .. })));
    }

    #[test]
    fn test_minimum_depth_grouping() {
        // Diamond: a -> {b, c} -> d, plus independent e
        let wf = workflow(vec![
            TaskSpec::new("a", "noop"),
            TaskSpec::new("b", "noop").with_input("x", "{{tasks.a.output}}"),
            TaskSpec::new("c", "noop").with_input("x", "{{tasks.a.output}}"),
            TaskSpec::new("d", "noop")
                .with_input("x", "{{tasks.b.output}}")
                .with_input("y", "{{tasks.c.output}}"),
            TaskSpec::new("e", "noop"),
        ]);
        let graph = build(&wf).unwrap();

        // Group index is exactly 1 + max(dep indices), 0 for roots
        for (task_id, deps) in graph.dependencies() {
            let index = graph.group_index_of(task_id).unwrap();
            let expected = deps
                .iter()
                .map(|d| graph.group_index_of(d).unwrap() + 1)
                .max()
                .unwrap_or(0);
            assert_eq!(index, expected, "task {task_id} scheduled late");
        }
        assert_eq!(graph.groups()[0].tasks, vec!["a", "e"]);
        assert_eq!(graph.groups()[2].tasks, vec!["d"]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let wf = workflow(vec![
            TaskSpec::new("z", "noop"),
            TaskSpec::new("m", "noop").with_input("x", "{{tasks.z.output}}"),
            TaskSpec::new("a", "noop").with_input("x", "{{tasks.z.output}}"),
        ]);
        let first = build(&wf).unwrap();
        let second = build(&wf).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.groups()[1].tasks, vec!["a", "m"]);
    }

    #[test]
    fn test_empty_workflow_builds_empty_graph() {
        let graph = build(&workflow(vec![])).unwrap();
        assert_eq!(graph.task_count(), 0);
        assert!(graph.groups().is_empty());
    }
}
