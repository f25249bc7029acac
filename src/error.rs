//! Error types for form generation

use thiserror::Error;

/// Result type for form generation
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Form generation errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid field path `{input}`: {reason}")]
    InvalidPath { input: String, reason: String },

    #[error("Invalid definition entry: {0}")]
    InvalidDefinition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    pub(crate) fn invalid_path(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
