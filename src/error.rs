//! Top-level error type unifying the crate's error surfaces.

use thiserror::Error;

use crate::orchestration::errors::{OrchestrationError, ValidationError};

/// Unified error for callers that consume the whole crate surface
#[derive(Debug, Error)]
pub enum ConductorError {
    #[error("Validation failed: {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<Vec<ValidationError>> for ConductorError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ConductorError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, ConductorError>;
