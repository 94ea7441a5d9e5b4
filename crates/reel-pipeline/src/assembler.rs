//! Scene assembly.
//!
//! Takes a scene whose assets are in place, probes the narration for its
//! duration, and routes to the single- or multi-image renderer. The audio
//! duration is probed exactly once here; the renderers trust the value they
//! are handed.

use std::path::Path;

use tracing::{debug, warn};

use reel_media::{
    audio_duration, render_multi_image_scene, render_single_image_scene, FfmpegRunner,
};
use reel_models::{EncodingConfig, Scene};

use crate::error::{PipelineError, PipelineResult};

/// Render one scene to a normalized clip at `output`.
///
/// Image paths that no longer exist on disk are dropped before routing; a
/// scene left with zero usable images is reported as
/// [`PipelineError::NoUsableImages`] so the orchestrator can skip it instead
/// of failing the run.
pub async fn assemble_scene(
    scene: &Scene,
    output: &Path,
    work_dir: &Path,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
) -> PipelineResult<()> {
    let audio = scene
        .audio
        .as_deref()
        .ok_or(PipelineError::MissingAudio(scene.scene_number))?;

    let images = scene.existing_images();
    if images.len() < scene.images.len() {
        warn!(
            scene = scene.scene_number,
            "{} of {} images missing on disk",
            scene.images.len() - images.len(),
            scene.images.len()
        );
    }
    if images.is_empty() {
        return Err(PipelineError::NoUsableImages(scene.scene_number));
    }

    let duration = audio_duration(audio).await?;
    debug!(
        scene = scene.scene_number,
        duration, "Assembling scene with {} images", images.len()
    );

    if images.len() == 1 {
        render_single_image_scene(&images[0], audio, duration, output, encoding, runner).await?;
    } else {
        render_multi_image_scene(&images, audio, duration, output, work_dir, encoding, runner)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_scene_without_audio_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let scene = Scene::new(4, "n", "d");
        let err = assemble_scene(
            &scene,
            &dir.path().join("scene_4.mp4"),
            dir.path(),
            &EncodingConfig::default(),
            &FfmpegRunner::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PipelineError::MissingAudio(4)));
    }

    #[tokio::test]
    async fn test_scene_with_no_surviving_images_is_skippable() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("scene_2.mp3");
        tokio::fs::write(&audio, b"mp3").await.unwrap();

        let mut scene = Scene::new(2, "n", "d");
        scene.audio = Some(audio);
        scene.images = vec![PathBuf::from("/nonexistent/a.jpg")];

        let err = assemble_scene(
            &scene,
            &dir.path().join("scene_2.mp4"),
            dir.path(),
            &EncodingConfig::default(),
            &FfmpegRunner::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PipelineError::NoUsableImages(2)));
    }
}
