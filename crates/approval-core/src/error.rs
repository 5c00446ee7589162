//! Error types for the approval workflow

use approval_types::Role;
use std::fmt;
use thiserror::Error;

/// A single invalid input field, reported back to the caller by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

/// Main error type for all workflow operations
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Application not found: {0}")]
    NotFound(String),

    #[error("Invalid status for this action: {0}")]
    InvalidTransition(String),

    #[error("Application was modified concurrently: {0}")]
    InvalidState(String),

    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Role '{role}' may not act on an application in status '{status}'")]
    Forbidden { role: Role, status: &'static str },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkflowError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// Whether the caller may retry the whole operation after re-reading state
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InvalidState(_) | Self::Persistence(_) | Self::Io(_))
    }

    /// Field errors carried by a validation failure, empty for other variants
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}

/// Result type for workflow operations
pub type Result<T> = std::result::Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_field() {
        let err = WorkflowError::Validation(vec![
            FieldError::new("signature", "is required"),
            FieldError::new("days_approved", "must be positive"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: signature: is required; days_approved: must be positive"
        );
        assert_eq!(err.field_errors().len(), 2);
    }

    #[test]
    fn test_retry_classification() {
        assert!(WorkflowError::InvalidState("x".into()).is_retryable());
        assert!(WorkflowError::Persistence("disk".into()).is_retryable());
        assert!(!WorkflowError::NotFound("x".into()).is_retryable());
        assert!(!WorkflowError::InvalidTransition("x".into()).is_retryable());
        assert!(!WorkflowError::validation("comments", "too long").is_retryable());
    }
}
