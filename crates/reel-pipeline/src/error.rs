//! Pipeline error types.

use thiserror::Error;

use reel_cache::CacheError;
use reel_media::MediaError;
use reel_providers::ProviderError;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a run or a single scene.
///
/// Scene-level failures are absorbed by the orchestrator (the scene ends
/// `Skipped` or `Failed`); only run-level errors propagate to the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Planner produced no scenes")]
    NoScenes,

    #[error("No scene clips were rendered")]
    NoClips,

    #[error("Scene {0} has no narration audio")]
    MissingAudio(u32),

    #[error("Scene {0} has no usable images")]
    NoUsableImages(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Unwrap a cache-producer failure back to its provider error.
    pub(crate) fn from_cache(err: CacheError) -> Self {
        match err {
            CacheError::Producer(inner) => match inner.downcast::<ProviderError>() {
                Ok(provider) => PipelineError::Provider(provider),
                Err(other) => PipelineError::Cache(CacheError::Producer(other)),
            },
            other => PipelineError::Cache(other),
        }
    }
}
