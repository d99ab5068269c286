//! Error types for persona.
//!
//! Per-document analysis never fails: a matcher that cannot consume a span
//! simply reports no match. The errors here surface from construction
//! (vocabulary and lexicon loading, configuration parsing) and from the
//! token-view primitives hosts may call directly.

use thiserror::Error;

/// Result type for persona operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for persona operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Vocabulary or lexicon tables could not be built.
    #[error("Initialization failed: {0}")]
    Init(String),

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON resource error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Token view or slot operation failed.
    #[error(transparent)]
    Core(#[from] persona_core::Error),
}

impl Error {
    /// Create an initialization error.
    #[must_use]
    pub fn init(msg: impl Into<String>) -> Self {
        Error::Init(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
