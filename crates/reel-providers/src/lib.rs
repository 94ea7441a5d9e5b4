//! Collaborator clients for the StoryReel pipeline.
//!
//! This crate provides:
//! - Scene planning via an OpenAI-compatible chat completion endpoint
//! - Narration synthesis via an HTTP text-to-speech endpoint
//! - Image acquisition as an ordered list of provider strategies

pub mod error;
pub mod images;
pub mod planner;
pub mod tts;

pub use error::{ProviderError, ProviderResult};
pub use images::{
    AcquisitionPlan, AcquisitionStrategy, HttpImageProvider, ImageProvider, PromptVariant,
};
pub use planner::{chunk_story, PlanStyle, PlannerClient, MAX_CHUNK_CHARS};
pub use tts::{convert_to_ssml, TtsClient, VoiceConfig};
