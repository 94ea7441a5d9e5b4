//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// One input to an FFmpeg invocation, with its per-input arguments
/// (the flags that must appear before its `-i`).
#[derive(Debug, Clone)]
struct FfmpegInput {
    path: PathBuf,
    args: Vec<String>,
}

/// Builder for FFmpeg commands with any number of inputs.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Ordered inputs
    inputs: Vec<FfmpegInput>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after the last -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command targeting `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input with no per-input arguments.
    pub fn input(self, path: impl AsRef<Path>) -> Self {
        self.input_with_args(path, std::iter::empty::<String>())
    }

    /// Add an input preceded by the given arguments (e.g. `-loop 1 -t 3.0`).
    pub fn input_with_args<I, S>(mut self, path: impl AsRef<Path>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(FfmpegInput {
            path: path.as_ref().to_path_buf(),
            args: args.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Add an output argument (after the inputs).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream label into the output.
    pub fn map(self, label: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(label)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set pixel format.
    pub fn pix_fmt(self, format: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    /// Set output frame rate.
    pub fn frame_rate(self, fps: u32) -> Self {
        self.output_arg("-r").output_arg(fps.to_string())
    }

    /// Limit output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Set encoder tuning (e.g. "stillimage").
    pub fn tune(self, profile: impl Into<String>) -> Self {
        self.output_arg("-tune").output_arg(profile)
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        for input in &self.inputs {
            args.extend(input.args.clone());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());

        args
    }

    /// Output path this command writes to.
    pub fn output_path(&self) -> &Path {
        &self.output
    }
}

/// Runner for FFmpeg commands with timeout enforcement.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut command = Command::new("ffmpeg");
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = if let Some(timeout_secs) = self.timeout_secs {
            let timeout = std::time::Duration::from_secs(timeout_secs);
            match tokio::time::timeout(timeout, command.output()).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!("FFmpeg timed out after {} seconds, killing process", timeout_secs);
                    return Err(MediaError::Timeout(timeout_secs));
                }
            }
        } else {
            command.output().await?
        };

        if output.status.success() {
            Ok(())
        } else {
            Err(MediaError::render(
                "FFmpeg exited with non-zero status",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
                output.status.code(),
            ))
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_single_input() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input_with_args("img.jpg", ["-loop", "1"])
            .input("audio.mp3")
            .video_codec("libx264")
            .audio_codec("aac")
            .duration(6.2)
            .frame_rate(25);

        let args = cmd.build_args();
        // Input args precede their own -i
        let loop_pos = args.iter().position(|a| a == "-loop").unwrap();
        let first_i = args.iter().position(|a| a == "-i").unwrap();
        assert!(loop_pos < first_i);

        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 2);
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"6.200".to_string()));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_command_builder_input_order() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input("a.jpg")
            .input("b.jpg")
            .input("c.jpg");

        let args = cmd.build_args();
        let a = args.iter().position(|x| x == "a.jpg").unwrap();
        let b = args.iter().position(|x| x == "b.jpg").unwrap();
        let c = args.iter().position(|x| x == "c.jpg").unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_overwrite_and_log_level() {
        let args = FfmpegCommand::new("out.mp4").input("in.mp4").build_args();
        assert_eq!(args[0], "-y");
        assert_eq!(args[1], "-v");
        assert_eq!(args[2], "error");
    }
}
