//! Error types for Chabunhae
//!
//! Build-time failures (`IndexBuild`) are fatal to serving; everything else
//! is reported per request and leaves the process usable.

use thiserror::Error;

/// Main error type for the retrieval pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Search index could not be built; no partial index is kept
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    /// Generative service call failed, was rate-limited or timed out
    #[error("Answer generation failed: {0}")]
    Generation(String),

    /// Blank user input, rejected before any service call
    #[error("사고 상황을 입력해주세요.")]
    EmptyQuery,

    /// Query-time embedding failure
    #[error("Embedding request failed: {0}")]
    Embedding(String),

    /// Record file could not be read or parsed
    #[error("Record store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

impl RagError {
    /// Whether this error must stop the process instead of failing one request
    pub fn is_fatal(&self) -> bool {
        matches!(self, RagError::IndexBuild(_) | RagError::Config(_))
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;

/// Convert anyhow errors to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Generic(format!("{:#}", err))
    }
}
