//! Progress updates and the final pipeline report.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Progress snapshot emitted after each scene-level milestone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Scenes that have reached a terminal state.
    pub completed: usize,
    /// Total planned scenes.
    pub total: usize,
    /// Human-readable status line.
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(completed: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            completed,
            total,
            message: message.into(),
        }
    }

    /// Completion percentage, rounded.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u8
    }
}

/// Outcome of a pipeline run.
///
/// Partial success is reported, not hidden: skipped scenes are listed next to
/// the scenes that made it into the final video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Path of the final video.
    pub video_path: PathBuf,
    /// Scene numbers included in the final video, ascending.
    pub included_scenes: Vec<u32>,
    /// Scene numbers that ended skipped or failed.
    pub skipped_scenes: Vec<u32>,
}

impl PipelineReport {
    /// True when every planned scene made it into the video.
    pub fn is_complete(&self) -> bool {
        self.skipped_scenes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(ProgressUpdate::new(0, 0, "").percent(), 0);
        assert_eq!(ProgressUpdate::new(1, 3, "").percent(), 33);
        assert_eq!(ProgressUpdate::new(3, 3, "").percent(), 100);
    }

    #[test]
    fn test_report_completeness() {
        let report = PipelineReport {
            video_path: PathBuf::from("/tmp/out.mp4"),
            included_scenes: vec![1, 3],
            skipped_scenes: vec![2],
        };
        assert!(!report.is_complete());
    }
}
