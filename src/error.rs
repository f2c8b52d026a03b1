//! Minoai Error Types
//!
//! Error handling for the OpenAI client library.

use thiserror::Error;

/// Main error type for minoai operations
#[derive(Debug, Error)]
pub enum MinoaiError {
    /// Building the outbound HTTP request failed (malformed URL or header)
    #[error("failed to build request: {0}")]
    RequestBuild(String),

    /// The transport failed to send the request or read the response
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded into the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The caller supplied an invalid argument
    #[error("validation error: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for MinoaiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MinoaiError::Decode(err.to_string())
        } else if err.is_timeout() {
            MinoaiError::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            MinoaiError::Transport(format!("connection failed: {}", err))
        } else {
            MinoaiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MinoaiError {
    fn from(err: serde_json::Error) -> Self {
        MinoaiError::Decode(format!("JSON parsing error: {}", err))
    }
}

/// Result type alias for minoai operations
pub type Result<T> = std::result::Result<T, MinoaiError>;
