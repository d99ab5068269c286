//! Error types for persona-core.

use thiserror::Error;

/// Result type for persona-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for persona-core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Token span error (unknown token or unreachable span end).
    #[error("Token span error: {0}")]
    Span(String),
}

impl Error {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a token span error.
    #[must_use]
    pub fn span(msg: impl Into<String>) -> Self {
        Self::Span(msg.into())
    }
}
