use thiserror::Error;

use super::types::{WorkflowId, WorkflowStatus};

/// Failures surfaced by workflow operations. None of them are retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Workflow '{workflow_id}' not found")]
    NotFound { workflow_id: WorkflowId },

    #[error("Workflow '{workflow_id}' cannot move from {from} to {to}")]
    InvalidTransition {
        workflow_id: WorkflowId,
        from: WorkflowStatus,
        to: WorkflowStatus,
    },

    #[error("Workflow '{workflow_id}' already exists")]
    DuplicateId { workflow_id: WorkflowId },

    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

impl WorkflowError {
    /// Stable tag for transports that need to map errors to responses
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::DuplicateId { .. } => "duplicate_id",
            Self::Validation { .. } => "validation_error",
        }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}
