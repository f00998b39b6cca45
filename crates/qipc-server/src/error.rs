//! Server error types.

use thiserror::Error;

/// Errors that can occur while running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration problem preventing startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Socket-level failure (bind, accept).
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}
