//! Error types for model operations
//!
//! Model operations either fail in the database layer or are rejected by
//! validation before anything is written. Validation failures carry
//! field-level messages so callers can show them next to the input.
//!
//! # Example
//!
//! ```
//! use bazaar_shared::error::{FieldError, ModelError};
//!
//! let err = ModelError::Validation(vec![FieldError::new("name", "can't be blank")]);
//! assert_eq!(err.to_string(), "Validation failed: name can't be blank");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field-level validation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Attribute that failed validation
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    /// Creates a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Errors returned by model operations
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The record was rejected before saving
    #[error("Validation failed: {}", join_messages(.0))]
    Validation(Vec<FieldError>),

    /// A referenced record does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Avatar storage failed while saving the record
    #[error("Avatar storage failed: {0}")]
    Storage(#[from] crate::storage::StorageError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ModelError {
    /// Returns the field errors of a validation failure
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            ModelError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Builds a validation error for a single field
    pub fn invalid(field: &str, message: &str) -> Self {
        ModelError::Validation(vec![FieldError::new(field, message)])
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;
