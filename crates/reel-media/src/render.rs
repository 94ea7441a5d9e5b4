//! Scene renderers.
//!
//! Both renderers emit clips in the shared normalized format (H.264 video,
//! AAC audio, 1280x720, yuv420p, 25 fps) so concatenation can stream-copy.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use reel_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::timing::{select_image_slots, TimingPlan, TransitionPlan};
use crate::xfade::TransitionGraph;

/// Render a scene clip from a single static image and its narration audio.
///
/// The image is looped for the full audio duration; the output is trimmed to
/// exactly `duration` seconds.
pub async fn render_single_image_scene(
    image: &Path,
    audio: &Path,
    duration: f64,
    output: &Path,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    if !image.exists() {
        return Err(MediaError::FileNotFound(image.to_path_buf()));
    }
    if !audio.exists() {
        return Err(MediaError::FileNotFound(audio.to_path_buf()));
    }

    info!(
        "Rendering single-image scene: {} + {} -> {} ({:.2}s)",
        image.display(),
        audio.display(),
        output.display(),
        duration
    );

    let cmd = FfmpegCommand::new(output)
        .input_with_args(image, ["-loop", "1"])
        .input(audio)
        .video_filter(encoding.scale_filter())
        .video_codec(&encoding.codec)
        .audio_codec(&encoding.audio_codec)
        .tune("stillimage")
        .duration(duration)
        .frame_rate(encoding.fps);

    runner.run(&cmd).await
}

/// Render a scene clip from an ordered image sequence with cross-fades.
///
/// The audio duration is partitioned across the images (the trailing segment
/// absorbing any remainder), consecutive images are chained with 1-second
/// cross-fades, the visual track is rendered to an intermediate file, and the
/// narration audio is muxed in with the video stream copied.
///
/// If slot selection leaves a single image, this defers to
/// [`render_single_image_scene`] rather than building a zero-length
/// transition chain.
pub async fn render_multi_image_scene(
    images: &[PathBuf],
    audio: &Path,
    duration: f64,
    output: &Path,
    work_dir: &Path,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    if images.is_empty() {
        return Err(MediaError::render("No images for scene", None, None));
    }
    if !audio.exists() {
        return Err(MediaError::FileNotFound(audio.to_path_buf()));
    }
    for image in images {
        if !image.exists() {
            return Err(MediaError::FileNotFound(image.clone()));
        }
    }

    let slots = select_image_slots(images.len(), duration);
    let picked = &images[..slots];

    if picked.len() == 1 {
        return render_single_image_scene(&picked[0], audio, duration, output, encoding, runner)
            .await;
    }

    let timing = TimingPlan::new(picked.len(), duration)?;
    let transitions = TransitionPlan::from_timing(&timing);
    let graph = TransitionGraph::build(picked.len(), &encoding.scale_filter(), &transitions)?;

    info!(
        "Rendering multi-image scene: {} images over {:.2}s -> {}",
        picked.len(),
        duration,
        output.display()
    );
    debug!("Transition graph: {}", graph.to_filter_complex());

    // Stage 1: visual-only cross-fade track
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "scene".to_string());
    let intermediate = work_dir.join(format!("{}_img.mp4", stem));

    let mut visual_cmd = FfmpegCommand::new(&intermediate);
    for (image, segment) in picked.iter().zip(timing.segments()) {
        visual_cmd = visual_cmd.input_with_args(
            image,
            ["-loop".to_string(), "1".to_string(), "-t".to_string(), format!("{:.3}", segment)],
        );
    }
    let visual_cmd = visual_cmd
        .filter_complex(graph.to_filter_complex())
        .map(graph.output_map())
        .video_codec(&encoding.codec)
        .pix_fmt(&encoding.pix_fmt)
        .frame_rate(encoding.fps);

    runner.run(&visual_cmd).await?;

    // Stage 2: mux narration, copying the already-normalized video stream
    let mux_cmd = FfmpegCommand::new(output)
        .input(&intermediate)
        .input(audio)
        .video_codec("copy")
        .audio_codec(&encoding.audio_codec)
        .duration(duration);

    runner.run(&mux_cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_single_image_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let encoding = EncodingConfig::default();
        let runner = FfmpegRunner::new();

        let err = render_single_image_scene(
            Path::new("/nonexistent.jpg"),
            Path::new("/nonexistent.mp3"),
            5.0,
            &dir.path().join("out.mp4"),
            &encoding,
            &runner,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_multi_image_rejects_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let encoding = EncodingConfig::default();
        let runner = FfmpegRunner::new();

        let err = render_multi_image_scene(
            &[],
            Path::new("/nonexistent.mp3"),
            5.0,
            &dir.path().join("out.mp4"),
            dir.path(),
            &encoding,
            &runner,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::Render { .. }));
    }

    #[test]
    fn test_single_image_command_shape() {
        // The argument set the renderer submits for a 6.2s scene
        let encoding = EncodingConfig::default();
        let cmd = FfmpegCommand::new("scene_1.mp4")
            .input_with_args("img.jpg", ["-loop", "1"])
            .input("scene_1.mp3")
            .video_filter(encoding.scale_filter())
            .video_codec(&encoding.codec)
            .audio_codec(&encoding.audio_codec)
            .tune("stillimage")
            .duration(6.2)
            .frame_rate(encoding.fps);

        let args = cmd.build_args();
        assert!(args.windows(2).any(|w| w[0] == "-t" && w[1] == "6.200"));
        assert!(args.windows(2).any(|w| w[0] == "-r" && w[1] == "25"));
        assert!(args.windows(2).any(|w| w[0] == "-tune" && w[1] == "stillimage"));
        assert!(args.contains(&"scale=1280:720,format=yuv420p".to_string()));
    }
}
