//! Run-scoped progress tracking.
//!
//! One tracker per run counts terminal scenes against the planned total and
//! pushes `ProgressUpdate` snapshots to an optional channel. Every update is
//! also logged, so a headless run still shows its milestones.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use reel_models::ProgressUpdate;

/// Progress state for one pipeline run.
pub struct ProgressTracker {
    total: usize,
    completed: AtomicUsize,
    sender: Option<UnboundedSender<ProgressUpdate>>,
}

impl ProgressTracker {
    pub fn new(total: usize, sender: Option<UnboundedSender<ProgressUpdate>>) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            sender,
        }
    }

    /// Emit a milestone that does not finish a scene.
    pub fn note(&self, message: impl Into<String>) {
        self.emit(self.completed.load(Ordering::SeqCst), message.into());
    }

    /// Record a scene reaching a terminal state and emit the new count.
    pub fn scene_done(&self, message: impl Into<String>) {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.emit(completed, message.into());
    }

    /// Scenes that have reached a terminal state so far.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn emit(&self, completed: usize, message: String) {
        let update = ProgressUpdate::new(completed, self.total, message);
        info!(
            "[{}/{} {}%] {}",
            update.completed,
            update.total,
            update.percent(),
            update.message
        );
        if let Some(sender) = &self.sender {
            // A dropped receiver just means nobody is listening
            sender.send(update).ok();
        }
    }
}
