//! Error types for ferry

use thiserror::Error;

/// Result type alias for ferry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for ferry operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A forge API call was rejected by the remote
    #[error("{forge} API error ({status}): {message}")]
    Api {
        forge: &'static str,
        status: u16,
        message: String,
    },

    /// Transport failure talking to a forge
    #[error("HTTP error: {0}")]
    Http(String),

    /// Mirror clone from the source failed
    #[error("Mirror clone failed: {0}")]
    Clone(String),

    /// Mirror push to the destination failed
    #[error("Mirror push failed: {0}")]
    Push(String),

    /// Git repository inspection failed
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
