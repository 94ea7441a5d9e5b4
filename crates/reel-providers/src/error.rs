//! Provider (asset acquisition) error types.

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors from the planner, TTS, or image collaborators.
///
/// All of these are acquisition failures from the pipeline's point of view:
/// they downgrade the affected scene rather than aborting the run.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Scene planning failed: {0}")]
    Planner(String),

    #[error("Speech synthesis failed: {0}")]
    Tts(String),

    #[error("Image acquisition failed: {0}")]
    Images(String),

    #[error("Provider returned no usable result")]
    EmptyResult,

    #[error("Unexpected provider response: {0}")]
    BadResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] reel_cache::CacheError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    pub fn planner(msg: impl Into<String>) -> Self {
        Self::Planner(msg.into())
    }

    pub fn tts(msg: impl Into<String>) -> Self {
        Self::Tts(msg.into())
    }

    pub fn images(msg: impl Into<String>) -> Self {
        Self::Images(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn bad_response(msg: impl Into<String>) -> Self {
        Self::BadResponse(msg.into())
    }

    /// True for timeouts, which follow the same skip/fallback path as errors.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Http(e) if e.is_timeout())
    }
}
