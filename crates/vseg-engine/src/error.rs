//! Error types for segmentation operations.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during a segmentation run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input at {record}.{field}: {message}")]
    InvalidInput {
        record: String,
        field: &'static str,
        message: String,
    },

    #[error("Stream '{stream}' is not sorted at index {index}")]
    Unsorted { stream: &'static str, index: usize },

    #[error("Internal consistency violation: {0}")]
    Inconsistent(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Create an input-shape error naming the record and field.
    pub fn invalid_input(
        record: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            record: record.into(),
            field,
            message: message.into(),
        }
    }

    /// Create a logic-invariant violation.
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::Inconsistent(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error is a broken internal invariant rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Inconsistent(_))
    }
}
