//! Error types for forge API operations

use thiserror::Error;

/// Result type for forge API operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to a forge
#[derive(Error, Debug)]
pub enum Error {
    /// Transport error (connection, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the API
    #[error("{forge} API error ({status}): {message}")]
    Api {
        forge: &'static str,
        status: u16,
        message: String,
    },

    /// Response body did not match the expected schema
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Bad base URL or path
    #[error("Invalid URL: {0}")]
    Url(String),
}

impl From<Error> for ferry_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Http(e) => ferry_core::Error::Http(e.to_string()),
            Error::Api {
                forge,
                status,
                message,
            } => ferry_core::Error::Api {
                forge,
                status,
                message,
            },
            Error::Parse(e) => ferry_core::Error::Json(e),
            Error::Url(msg) => ferry_core::Error::Config(msg),
        }
    }
}
