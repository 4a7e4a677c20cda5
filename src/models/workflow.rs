//! # Workflow Definition Model
//!
//! The declarative shape of a workflow as owned by the external definition
//! store. The core only reads these structures; they are immutable for the
//! duration of one execution.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One task within a workflow definition.
///
/// Input values are plain strings that may embed template references such as
/// `{{tasks.fetch.output.body}}` or `{{input.region}}`. Dependencies are
/// inferred from those references and unioned with `depends_on`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Stable identifier, unique within the workflow
    pub id: String,
    /// Name of the reusable task type to invoke
    #[serde(rename = "taskRef")]
    pub task_ref: String,
    /// Field name to (possibly templated) value, in deterministic order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub input: BTreeMap<String, String>,
    /// Explicitly declared dependency task ids
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<String>,
}

impl TaskSpec {
    pub fn new(id: impl Into<String>, task_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            task_ref: task_ref.into(),
            input: BTreeMap::new(),
            depends_on: BTreeSet::new(),
        }
    }

    /// Builder-style helper for adding an input field
    pub fn with_input(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.input.insert(field.into(), value.into());
        self
    }

    /// Builder-style helper for declaring an explicit dependency
    pub fn with_dependency(mut self, task_id: impl Into<String>) -> Self {
        self.depends_on.insert(task_id.into());
        self
    }
}

/// A complete workflow definition: ordered task list plus workflow-level
/// input schema and output mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    /// Ordered task list; order is the author's, scheduling order comes from
    /// the execution graph
    pub tasks: Vec<TaskSpec>,
    /// Opaque JSON-Schema for workflow input; validated by the external gate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<serde_json::Value>,
    /// Output-mapping expression evaluated by the gateway after execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>, tasks: Vec<TaskSpec>) -> Self {
        Self {
            name: name.into(),
            tasks,
            input_schema: None,
            output: None,
        }
    }

    /// All task ids in definition order
    pub fn task_ids(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.id.as_str()).collect()
    }

    /// Look up a task by id
    pub fn task(&self, id: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Parse a definition from YAML (the definition store's wire format)
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_spec_builder() {
        let task = TaskSpec::new("fetch", "http")
            .with_input("url", "https://example.com")
            .with_dependency("auth");

        assert_eq!(task.id, "fetch");
        assert_eq!(task.task_ref, "http");
        assert_eq!(task.input.get("url").unwrap(), "https://example.com");
        assert!(task.depends_on.contains("auth"));
    }

    #[test]
    fn test_workflow_lookup() {
        let workflow = WorkflowDefinition::new(
            "pipeline",
            vec![TaskSpec::new("a", "noop"), TaskSpec::new("b", "noop")],
        );
        assert_eq!(workflow.task_ids(), vec!["a", "b"]);
        assert!(workflow.task("a").is_some());
        assert!(workflow.task("missing").is_none());
    }

    #[test]
    fn test_definition_from_yaml() {
        let yaml = r#"
name: order-pipeline
tasks:
  - id: fetch
    taskRef: http
    input:
      url: "https://example.com/orders"
  - id: transform
    taskRef: jq
    input:
      data: "{{tasks.fetch.output.body}}"
    depends_on: [fetch]
"#;
        let workflow = WorkflowDefinition::from_yaml(yaml).unwrap();
        assert_eq!(workflow.name, "order-pipeline");
        assert_eq!(workflow.tasks.len(), 2);
        assert!(workflow.tasks[1].depends_on.contains("fetch"));
    }
}
