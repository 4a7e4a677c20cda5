//! # Admission Gate
//!
//! Synchronous validation performed before a workflow definition is accepted
//! into the system. The external admission webhook is a blocking RPC into
//! this function: it builds the execution graph, discards it, and returns an
//! allow/deny decision carrying every structural problem found.

use serde::Serialize;

use crate::models::workflow::WorkflowDefinition;
use crate::orchestration::errors::ValidationError;
use crate::orchestration::graph_builder;

/// Allow/deny outcome for one workflow definition
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionDecision {
    pub allowed: bool,
    /// Human-readable summary for the webhook response
    pub message: String,
    /// Every structural problem found, empty when allowed
    #[serde(skip)]
    pub errors: Vec<ValidationError>,
}

impl AdmissionDecision {
    fn allow(workflow_name: &str) -> Self {
        Self {
            allowed: true,
            message: format!("workflow '{workflow_name}' is valid"),
            errors: Vec::new(),
        }
    }

    fn deny(workflow_name: &str, errors: Vec<ValidationError>) -> Self {
        let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        Self {
            allowed: false,
            message: format!(
                "workflow '{}' rejected: {}",
                workflow_name,
                details.join("; ")
            ),
            errors,
        }
    }
}

/// Validate a workflow definition for admission.
///
/// Never executes anything; a denied decision lists all problems in one
/// pass so the author can fix them together.
pub fn validate_workflow(workflow: &WorkflowDefinition) -> AdmissionDecision {
    match graph_builder::build(workflow) {
        Ok(_) => AdmissionDecision::allow(&workflow.name),
        Err(errors) => AdmissionDecision::deny(&workflow.name, errors),
    }
}
