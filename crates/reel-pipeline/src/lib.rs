//! Story-to-video pipeline orchestration.
//!
//! This crate provides:
//! - Pipeline configuration from the environment
//! - Scene assembly routing (single image vs. cross-fade sequence)
//! - The orchestrator driving planning, narration, images, rendering and
//!   concatenation with bounded concurrency
//! - Run-scoped progress tracking

pub mod assembler;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod progress;

pub use assembler::assemble_scene;
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use orchestrator::{Pipeline, SceneOutcome};
pub use progress::ProgressTracker;
