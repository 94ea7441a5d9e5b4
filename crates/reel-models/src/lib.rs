//! Shared data models for the StoryReel pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes and the per-scene state machine
//! - Output encoding configuration
//! - Progress updates and the final pipeline report

pub mod encoding;
pub mod report;
pub mod scene;

pub use encoding::{EncodingConfig, FRAME_RATE, OUTPUT_HEIGHT, OUTPUT_WIDTH, PIXEL_FORMAT};
pub use report::{PipelineReport, ProgressUpdate};
pub use scene::{Scene, SceneState};
