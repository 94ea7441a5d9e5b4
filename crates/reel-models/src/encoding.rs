//! Output encoding configuration.
//!
//! Every intermediate and final artifact shares one normalized format so the
//! concatenator can copy streams without re-encoding.

use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Normalized output width in pixels.
pub const OUTPUT_WIDTH: u32 = 1280;
/// Normalized output height in pixels.
pub const OUTPUT_HEIGHT: u32 = 720;
/// Constant output frame rate.
pub const FRAME_RATE: u32 = 25;
/// Pixel format shared by all artifacts.
pub const PIXEL_FORMAT: &str = "yuv420p";

/// Video encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Output width
    #[serde(default = "default_width")]
    pub width: u32,

    /// Output height
    #[serde(default = "default_height")]
    pub height: u32,

    /// Frames per second
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Pixel format
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_width() -> u32 {
    OUTPUT_WIDTH
}
fn default_height() -> u32 {
    OUTPUT_HEIGHT
}
fn default_fps() -> u32 {
    FRAME_RATE
}
fn default_pix_fmt() -> String {
    PIXEL_FORMAT.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            width: OUTPUT_WIDTH,
            height: OUTPUT_HEIGHT,
            fps: FRAME_RATE,
            pix_fmt: PIXEL_FORMAT.to_string(),
        }
    }
}

impl EncodingConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scale-and-normalize filter applied to every image input.
    pub fn scale_filter(&self) -> String {
        format!("scale={}:{},format={}", self.width, self.height, self.pix_fmt)
    }

    /// One frame interval in seconds, the tolerance for duration assertions.
    pub fn frame_interval(&self) -> f64 {
        1.0 / self.fps as f64
    }
}
