//! FFmpeg CLI wrapper for the StoryReel assembly pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with per-input arguments
//! - Audio duration probing via ffprobe
//! - Timing and transition planning for multi-image scenes
//! - Cross-fade filter graphs built as typed nodes
//! - Single- and multi-image scene renderers
//! - Stream-copy concatenation of normalized scene clips

pub mod command;
pub mod concat;
pub mod error;
pub mod probe;
pub mod render;
pub mod timing;
pub mod xfade;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::concatenate;
pub use error::{MediaError, MediaResult};
pub use probe::{audio_duration, probe_audio, AudioInfo};
pub use render::{render_multi_image_scene, render_single_image_scene};
pub use timing::{select_image_slots, TimingPlan, TransitionPlan, MIN_SEGMENT_SECS, TRANSITION_SECS};
pub use xfade::{FilterNode, TransitionGraph};
