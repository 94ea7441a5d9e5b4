//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::PipelineResult;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum scenes processed concurrently
    pub scene_parallel: usize,
    /// Scratch directory for audio staging, intermediates and scene clips
    pub work_dir: PathBuf,
    /// Content-addressed cache directory
    pub cache_dir: PathBuf,
    /// Directory downloaded images land in
    pub image_dir: PathBuf,
    /// Timeout per FFmpeg invocation
    pub render_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scene_parallel: 2,
            work_dir: PathBuf::from("/tmp/storyreel/work"),
            cache_dir: PathBuf::from("/tmp/storyreel/cache"),
            image_dir: PathBuf::from("/tmp/storyreel/images"),
            render_timeout: Duration::from_secs(600),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            scene_parallel: std::env::var("PIPELINE_SCENE_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            work_dir: std::env::var("PIPELINE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/storyreel/work")),
            cache_dir: std::env::var("PIPELINE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/storyreel/cache")),
            image_dir: std::env::var("PIPELINE_IMAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/storyreel/images")),
            render_timeout: Duration::from_secs(
                std::env::var("PIPELINE_RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }

    /// Create the scratch directories.
    pub fn ensure_dirs(&self) -> PipelineResult<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        std::fs::create_dir_all(&self.image_dir)?;
        Ok(())
    }
}
