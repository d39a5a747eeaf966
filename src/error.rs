//! Error types for statetree

use thiserror::Error;

/// Result type alias for statetree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in statetree operations
///
/// None of these are fatal to a [`Store`](crate::Store): decode failures are
/// recovered at the call site and lookup misses are plain `None`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Payload decode error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Payload encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Node has no payload: {0}")]
    MissingPayload(String),

    #[error("Config error: {0}")]
    Config(String),
}
