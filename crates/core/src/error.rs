//! Domain error type shared by every crate in the workspace.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A required field is missing or a value is out of range for the
    /// requested operation. No mutation is applied.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The target record is locked by another user, was modified since it
    /// was read, or is already in a closed state.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The acting user lacks the role or ownership the operation requires.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build a validation error naming every missing field.
    pub fn missing_fields(operation: &str, fields: &[&str]) -> Self {
        CoreError::Validation(format!(
            "Cannot {operation}: missing required field(s): {}",
            fields.join(", ")
        ))
    }
}
