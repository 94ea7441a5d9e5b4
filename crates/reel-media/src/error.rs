//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during probing, rendering and concatenation.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Probe failed: {message}")]
    Probe {
        message: String,
        stderr: Option<String>,
    },

    #[error("No audio stream found in {0}")]
    NoAudioStream(PathBuf),

    #[error("Non-positive duration {duration} for {path}")]
    InvalidDuration { path: PathBuf, duration: f64 },

    #[error("Render failed: {message}")]
    Render {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Concatenation failed: {0}")]
    Concat(String),

    #[error("No clips to concatenate")]
    NoClips,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a probe failure error.
    pub fn probe(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Probe {
            message: message.into(),
            stderr,
        }
    }

    /// Create a render failure error.
    pub fn render(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::Render {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a concatenation failure error.
    pub fn concat(message: impl Into<String>) -> Self {
        Self::Concat(message.into())
    }

    /// Probe-class errors: missing or unreadable audio, no stream.
    pub fn is_probe(&self) -> bool {
        matches!(
            self,
            MediaError::Probe { .. }
                | MediaError::NoAudioStream(_)
                | MediaError::InvalidDuration { .. }
                | MediaError::FfprobeNotFound
        )
    }

    /// Concat-class errors are fatal to the whole run.
    pub fn is_concat(&self) -> bool {
        matches!(self, MediaError::Concat(_) | MediaError::NoClips)
    }
}
