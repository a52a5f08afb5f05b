/// Core error types for Elocute
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while building or reading domain values
#[derive(Error, Debug)]
pub enum CoreError {
    /// Language code outside the set the engine understands
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Result descriptor could not be decoded
    #[error("Malformed result descriptor: {0}")]
    MalformedResult(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a malformed result error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResult(msg.into())
    }
}
