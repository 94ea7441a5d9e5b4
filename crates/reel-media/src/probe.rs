//! FFprobe audio information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Timeout for a probe invocation. Probing is read-only and fast; a hang
/// here means the asset or the toolchain is broken.
const PROBE_TIMEOUT_SECS: u64 = 30;

/// Audio file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Audio codec
    pub codec: String,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// File size in bytes
    pub size: u64,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    sample_rate: Option<String>,
    duration: Option<String>,
}

/// Probe an audio file for information.
///
/// Fails if the file is missing, ffprobe is unavailable or errors, the file
/// has no audio stream, or the reported duration is not positive.
pub async fn probe_audio(path: impl AsRef<Path>) -> MediaResult<AudioInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let mut command = Command::new("ffprobe");
    command
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let timeout = std::time::Duration::from_secs(PROBE_TIMEOUT_SECS);
    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => result?,
        Err(_) => return Err(MediaError::Timeout(PROBE_TIMEOUT_SECS)),
    };

    if !output.status.success() {
        return Err(MediaError::probe(
            "FFprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let audio_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "audio")
        .ok_or_else(|| MediaError::NoAudioStream(path.to_path_buf()))?;

    // Container duration, falling back to the stream's own
    let duration = probe
        .format
        .duration
        .as_ref()
        .or(audio_stream.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    if duration <= 0.0 {
        return Err(MediaError::InvalidDuration {
            path: path.to_path_buf(),
            duration,
        });
    }

    let size = probe
        .format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let sample_rate = audio_stream
        .sample_rate
        .as_ref()
        .and_then(|r| r.parse::<u32>().ok())
        .unwrap_or(0);

    Ok(AudioInfo {
        duration,
        codec: audio_stream.codec_name.clone().unwrap_or_default(),
        sample_rate,
        size,
    })
}

/// Get audio duration in seconds.
pub async fn audio_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let info = probe_audio(path).await?;
    Ok(info.duration)
}
