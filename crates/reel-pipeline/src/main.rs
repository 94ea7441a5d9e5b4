//! StoryReel pipeline binary.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_media::{check_ffmpeg, check_ffprobe};
use reel_pipeline::{Pipeline, PipelineConfig};
use reel_providers::{
    AcquisitionPlan, HttpImageProvider, ImageProvider, PlanStyle, PlannerClient, TtsClient,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("reel_pipeline=info".parse().unwrap())
        .add_directive("reel_providers=info".parse().unwrap())
        .add_directive("reel_media=info".parse().unwrap())
        .add_directive("reel_cache=info".parse().unwrap())
        .add_directive("storyreel=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting storyreel");

    if let Err(e) = run().await {
        error!("Pipeline failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let story_path = args
        .next()
        .context("Usage: storyreel <story.txt> [output.mp4]")?;
    let output = args.next().unwrap_or_else(|| "story.mp4".to_string());

    check_ffmpeg().context("ffmpeg is required")?;
    check_ffprobe().context("ffprobe is required")?;

    let story = tokio::fs::read_to_string(&story_path)
        .await
        .with_context(|| format!("Failed to read story from {}", story_path))?;

    let style: PlanStyle = std::env::var("PLAN_STYLE")
        .unwrap_or_else(|_| "general".to_string())
        .parse()?;

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    let planner = PlannerClient::from_env()?;
    let tts = TtsClient::from_env()?;

    let primary_endpoint =
        std::env::var("PRIMARY_IMAGE_ENDPOINT").context("PRIMARY_IMAGE_ENDPOINT not set")?;
    let primary_key = std::env::var("PRIMARY_IMAGE_API_KEY").ok();
    let fallback_endpoint = std::env::var("FALLBACK_IMAGE_ENDPOINT")
        .unwrap_or_else(|_| primary_endpoint.clone());
    let fallback_key = std::env::var("FALLBACK_IMAGE_API_KEY")
        .ok()
        .or_else(|| primary_key.clone());

    let primary: Arc<dyn ImageProvider> =
        Arc::new(HttpImageProvider::new("primary", primary_endpoint, primary_key)?);
    let fallback: Arc<dyn ImageProvider> =
        Arc::new(HttpImageProvider::new("fallback", fallback_endpoint, fallback_key)?);
    let acquisition = AcquisitionPlan::standard(primary, fallback);

    let pipeline = Arc::new(Pipeline::new(config, planner, tts, acquisition)?);
    let report = pipeline.run(&story, style, Path::new(&output)).await?;

    info!(
        "Video written to {} ({} scenes included)",
        report.video_path.display(),
        report.included_scenes.len()
    );
    if !report.is_complete() {
        warn!("Scenes missing from the final video: {:?}", report.skipped_scenes);
    }
    Ok(())
}
