//! Scene clip concatenation.
//!
//! Clips arrive pre-sorted by scene number and already share the normalized
//! codec/resolution/frame rate, so joining is a stream copy through the
//! concat demuxer with no re-encoding.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Join ordered scene clips into one continuous video at `output`.
///
/// Zero clips is an error (the caller reports the run as failed); a single
/// clip is copied directly; two or more go through a concat manifest with
/// `-c copy`.
pub async fn concatenate(
    clips: &[PathBuf],
    output: &Path,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    if clips.is_empty() {
        return Err(MediaError::NoClips);
    }

    for clip in clips {
        if !clip.exists() {
            return Err(MediaError::concat(format!(
                "Clip missing at concatenation time: {}",
                clip.display()
            )));
        }
    }

    if clips.len() == 1 {
        info!("Single clip, copying to {}", output.display());
        tokio::fs::copy(&clips[0], output)
            .await
            .map_err(|e| MediaError::concat(format!("Failed to copy clip: {}", e)))?;
        return Ok(());
    }

    let manifest_path = manifest_path_for(&clips[0], output);
    let manifest = build_manifest(clips);
    tokio::fs::write(&manifest_path, manifest)
        .await
        .map_err(|e| MediaError::concat(format!("Failed to write concat manifest: {}", e)))?;

    info!("Concatenating {} clips -> {}", clips.len(), output.display());

    let cmd = FfmpegCommand::new(output)
        .input_with_args(&manifest_path, ["-f", "concat", "-safe", "0"])
        .output_args(["-c", "copy"]);

    runner.run(&cmd).await.map_err(|e| match e {
        MediaError::Render {
            message,
            stderr,
            exit_code,
        } => MediaError::concat(format!(
            "{} (exit code {:?}){}",
            message,
            exit_code,
            stderr.map(|s| format!(": {}", s)).unwrap_or_default()
        )),
        other => other,
    })
}

/// Manifest lives next to the clips, in the run's scratch directory.
fn manifest_path_for(first_clip: &Path, output: &Path) -> PathBuf {
    first_clip
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!(
            "{}_concat.txt",
            output
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "video".to_string())
        ))
}

/// Concat demuxer manifest: one `file '...'` line per clip, single quotes
/// escaped per the demuxer's quoting rules.
fn build_manifest(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| {
            let escaped = clip.to_string_lossy().replace('\'', r"'\''");
            format!("file '{}'", escaped)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
