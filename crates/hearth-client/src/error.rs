//! Error types for the hearth client.

use thiserror::Error;

use crate::remote::MutationError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Remote call failed: {0}")]
    Remote(#[from] MutationError),

    #[error("Realtime stream error: {0}")]
    Stream(String),

    #[error("Invalid event payload: {0}")]
    Event(#[from] hearth_core::Error),

    #[error("Board task has stopped")]
    BoardClosed,
}

/// Result type alias using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;
