//! Scene data model and per-scene state machine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One narrated unit of the story.
///
/// Scenes come out of the planner with `scene_number`, `narration`,
/// `description` and optionally `ttl` populated. The orchestrator fills in
/// `audio` and `images` as the collaborators deliver assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Positive, unique; defines final ordering in the output video.
    pub scene_number: u32,
    /// Plain-text voice-over.
    pub narration: String,
    /// Visual description used as the image prompt.
    pub description: String,
    /// SSML-annotated narration, preferred over `narration` for synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    /// Rendered narration audio, set by the TTS collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<PathBuf>,
    /// Ordered image paths, set by the image collaborator.
    #[serde(default)]
    pub images: Vec<PathBuf>,
}

impl Scene {
    /// Create a planned scene without assets.
    pub fn new(scene_number: u32, narration: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            scene_number,
            narration: narration.into(),
            description: description.into(),
            ttl: None,
            audio: None,
            images: Vec::new(),
        }
    }

    /// Text to hand to the TTS collaborator: SSML if present, narration otherwise.
    pub fn speech_text(&self) -> &str {
        self.ttl.as_deref().unwrap_or(&self.narration)
    }

    /// A scene is eligible for rendering once audio is set and at least one
    /// image path exists on disk.
    pub fn is_renderable(&self) -> bool {
        let audio_ok = self.audio.as_deref().is_some_and(|p| p.exists());
        audio_ok && self.images.iter().any(|p| p.exists())
    }

    /// Image paths that still exist on disk, in order.
    pub fn existing_images(&self) -> Vec<PathBuf> {
        self.images.iter().filter(|p| p.exists()).cloned().collect()
    }
}

/// Per-scene processing state.
///
/// `Pending → AudioReady → ImagesReady → Rendered`, with `Skipped` and
/// `Failed` as terminal alternatives. A scene that ends `Skipped` or `Failed`
/// is absent from the final video but does not abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneState {
    Pending,
    AudioReady,
    ImagesReady,
    Rendered,
    Skipped,
    Failed,
}

impl SceneState {
    /// String representation for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneState::Pending => "pending",
            SceneState::AudioReady => "audio_ready",
            SceneState::ImagesReady => "images_ready",
            SceneState::Rendered => "rendered",
            SceneState::Skipped => "skipped",
            SceneState::Failed => "failed",
        }
    }

    /// Whether this state ends the scene's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SceneState::Rendered | SceneState::Skipped | SceneState::Failed
        )
    }

    /// Whether the scene contributes a clip to concatenation.
    pub fn is_rendered(&self) -> bool {
        matches!(self, SceneState::Rendered)
    }
}

impl std::fmt::Display for SceneState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
