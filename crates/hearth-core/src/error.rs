//! Error types for the hearth core library.

use thiserror::Error;

/// Core error types for hearth operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid task ID: {0:?}")]
    InvalidTaskId(String),

    #[error("Invalid task type: {0}")]
    InvalidTaskType(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error was raised before any remote or storage call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidTaskId(_) | Error::InvalidTaskType(_) | Error::Validation(_)
        )
    }
}

/// Result type alias using the hearth Error type.
pub type Result<T> = std::result::Result<T, Error>;
