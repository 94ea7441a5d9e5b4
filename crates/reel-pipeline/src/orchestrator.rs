//! Pipeline orchestrator.
//!
//! Runs the full story-to-video flow: plan scenes, then for each scene
//! synthesize narration, acquire images and render a clip, with a bounded
//! number of scenes in flight. Scene failures downgrade that scene to
//! `Skipped` or `Failed`; the run only aborts when nothing can be assembled.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use reel_cache::Cache;
use reel_media::{concatenate, FfmpegRunner};
use reel_models::{EncodingConfig, PipelineReport, ProgressUpdate, Scene, SceneState};
use reel_providers::{
    AcquisitionPlan, PlanStyle, PlannerClient, ProviderError, TtsClient, VoiceConfig,
};

use crate::assembler::assemble_scene;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::progress::ProgressTracker;

/// Terminal result of one scene.
#[derive(Debug)]
pub struct SceneOutcome {
    pub scene_number: u32,
    pub state: SceneState,
    pub clip: Option<PathBuf>,
    pub reason: Option<String>,
}

impl SceneOutcome {
    fn rendered(scene_number: u32, clip: PathBuf) -> Self {
        Self {
            scene_number,
            state: SceneState::Rendered,
            clip: Some(clip),
            reason: None,
        }
    }

    fn skipped(scene_number: u32, reason: impl Into<String>) -> Self {
        Self {
            scene_number,
            state: SceneState::Skipped,
            clip: None,
            reason: Some(reason.into()),
        }
    }

    fn failed(scene_number: u32, reason: impl Into<String>) -> Self {
        Self {
            scene_number,
            state: SceneState::Failed,
            clip: None,
            reason: Some(reason.into()),
        }
    }
}

/// Progress message for a scene reaching `state`.
fn milestone(scene_number: u32, state: SceneState) -> String {
    format!("Scene {} {}", scene_number, state)
}

/// Split sorted outcomes into concatenation inputs and the report's
/// included/skipped scene number lists.
fn partition_outcomes(outcomes: &[SceneOutcome]) -> (Vec<PathBuf>, Vec<u32>, Vec<u32>) {
    let clips = outcomes
        .iter()
        .filter(|o| o.state.is_rendered())
        .filter_map(|o| o.clip.clone())
        .collect();
    let included = outcomes
        .iter()
        .filter(|o| o.state.is_rendered())
        .map(|o| o.scene_number)
        .collect();
    let skipped = outcomes
        .iter()
        .filter(|o| !o.state.is_rendered())
        .map(|o| o.scene_number)
        .collect();
    (clips, included, skipped)
}

/// The story-to-video pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    planner: PlannerClient,
    tts: TtsClient,
    voice: VoiceConfig,
    acquisition: AcquisitionPlan,
    cache: Cache,
    encoding: EncodingConfig,
    runner: FfmpegRunner,
    progress: Option<UnboundedSender<ProgressUpdate>>,
}

impl Pipeline {
    /// Create a pipeline with the default voice and encoding.
    pub fn new(
        config: PipelineConfig,
        planner: PlannerClient,
        tts: TtsClient,
        acquisition: AcquisitionPlan,
    ) -> PipelineResult<Self> {
        let cache = Cache::new(&config.cache_dir)?;
        let runner = FfmpegRunner::new().with_timeout(config.render_timeout.as_secs());
        Ok(Self {
            config,
            planner,
            tts,
            voice: VoiceConfig::default(),
            acquisition,
            cache,
            encoding: EncodingConfig::default(),
            runner,
            progress: None,
        })
    }

    /// Use a non-default voice.
    pub fn with_voice(mut self, voice: VoiceConfig) -> Self {
        self.voice = voice;
        self
    }

    /// Push progress updates to `sender` in addition to logging them.
    pub fn with_progress(mut self, sender: UnboundedSender<ProgressUpdate>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Run the pipeline: plan `story`, process every scene, and concatenate
    /// the rendered clips into `output`.
    pub async fn run(
        self: Arc<Self>,
        story: &str,
        style: PlanStyle,
        output: &Path,
    ) -> PipelineResult<PipelineReport> {
        self.config.ensure_dirs()?;

        let scenes = self.planner.plan(story, style, &self.cache).await?;
        if scenes.is_empty() {
            return Err(PipelineError::NoScenes);
        }
        let total = scenes.len();

        let tracker = Arc::new(ProgressTracker::new(total, self.progress.clone()));
        tracker.note(format!("Planned {} scenes", total));

        let scene_sem = Arc::new(Semaphore::new(self.config.scene_parallel));
        let fallback_sem = Arc::new(Semaphore::new(1));

        let mut tasks = JoinSet::new();
        for scene in scenes {
            let pipeline = Arc::clone(&self);
            let scene_sem = Arc::clone(&scene_sem);
            let fallback_sem = Arc::clone(&fallback_sem);
            let tracker = Arc::clone(&tracker);
            tasks.spawn(async move {
                // The semaphore is never closed while tasks run
                let _permit = scene_sem.acquire_owned().await.ok();
                pipeline.process_scene(scene, &fallback_sem, &tracker).await
            });
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("Scene task panicked: {}", e),
            }
        }
        outcomes.sort_by_key(|o| o.scene_number);
        let (clips, included_scenes, skipped_scenes) = partition_outcomes(&outcomes);

        for outcome in outcomes.iter().filter(|o| !o.state.is_rendered()) {
            warn!(
                scene = outcome.scene_number,
                state = %outcome.state,
                "Scene missing from final video: {}",
                outcome.reason.as_deref().unwrap_or("unknown")
            );
        }

        if clips.is_empty() {
            return Err(PipelineError::NoClips);
        }

        tracker.note(format!("Concatenating {} clips", clips.len()));
        concatenate(&clips, output, &self.runner).await?;
        tracker.note("Final video assembled");

        info!(
            "Pipeline finished: {} of {} scenes in {}",
            included_scenes.len(),
            total,
            output.display()
        );
        Ok(PipelineReport {
            video_path: output.to_path_buf(),
            included_scenes,
            skipped_scenes,
        })
    }

    /// Drive one scene to a terminal state. Never propagates an error; every
    /// failure path maps to a `Skipped` or `Failed` outcome.
    async fn process_scene(
        &self,
        mut scene: Scene,
        fallback_sem: &Semaphore,
        tracker: &ProgressTracker,
    ) -> SceneOutcome {
        let number = scene.scene_number;

        match self.synthesize_narration(&scene).await {
            Ok(audio) => scene.audio = Some(audio),
            Err(e) => {
                warn!(scene = number, "Narration failed: {}", e);
                tracker.scene_done(milestone(number, SceneState::Failed));
                return SceneOutcome::failed(number, e.to_string());
            }
        }
        tracker.note(milestone(number, SceneState::AudioReady));

        match self.acquire_cached_images(&scene.description, fallback_sem).await {
            Ok(images) => scene.images = images,
            Err(e) => {
                warn!(scene = number, "Image acquisition failed: {}", e);
                tracker.scene_done(milestone(number, SceneState::Skipped));
                return SceneOutcome::skipped(number, e.to_string());
            }
        }
        tracker.note(milestone(number, SceneState::ImagesReady));

        let clip = self.config.work_dir.join(format!("scene_{}.mp4", number));
        match assemble_scene(&scene, &clip, &self.config.work_dir, &self.encoding, &self.runner)
            .await
        {
            Ok(()) => {
                tracker.scene_done(milestone(number, SceneState::Rendered));
                SceneOutcome::rendered(number, clip)
            }
            Err(e @ PipelineError::NoUsableImages(_)) => {
                warn!(scene = number, "{}", e);
                tracker.scene_done(milestone(number, SceneState::Skipped));
                SceneOutcome::skipped(number, e.to_string())
            }
            Err(e) => {
                warn!(scene = number, "Render failed: {}", e);
                tracker.scene_done(milestone(number, SceneState::Failed));
                SceneOutcome::failed(number, e.to_string())
            }
        }
    }

    /// Synthesize (or fetch cached) narration audio for a scene.
    async fn synthesize_narration(&self, scene: &Scene) -> PipelineResult<PathBuf> {
        let speech = scene.speech_text().to_string();
        let staging = self
            .config
            .work_dir
            .join(format!("scene_{}.mp3", scene.scene_number));
        self.cache
            .get_or_compute_binary(&["tts", &speech], || async {
                Ok(self.tts.synthesize(&speech, &self.voice, &staging).await?)
            })
            .await
            .map_err(PipelineError::from_cache)
    }

    /// Acquire (or fetch cached) image paths for a scene description.
    async fn acquire_cached_images(
        &self,
        description: &str,
        fallback_sem: &Semaphore,
    ) -> PipelineResult<Vec<PathBuf>> {
        self.cache
            .get_or_compute_json(&["images", description], || async {
                Ok(self.acquire_images(description, fallback_sem).await?)
            })
            .await
            .map_err(PipelineError::from_cache)
    }

    /// Walk the acquisition ladder until a strategy yields images.
    async fn acquire_images(
        &self,
        description: &str,
        fallback_sem: &Semaphore,
    ) -> Result<Vec<PathBuf>, ProviderError> {
        let mut last_err = None;
        for strategy in self.acquisition.strategies() {
            let prompt = strategy.variant.apply(description);
            let _permit = if strategy.serialized {
                Some(
                    fallback_sem
                        .acquire()
                        .await
                        .map_err(|_| ProviderError::images("Fallback limiter closed"))?,
                )
            } else {
                None
            };

            match strategy
                .provider
                .generate(&prompt, &self.config.image_dir)
                .await
            {
                Ok(paths) => {
                    info!(
                        strategy = %strategy.label(),
                        count = paths.len(),
                        "Images acquired"
                    );
                    return Ok(paths);
                }
                Err(e) => {
                    warn!(strategy = %strategy.label(), "Image strategy failed: {}", e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(ProviderError::EmptyResult))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reel_providers::{HttpImageProvider, ImageProvider};
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StubProvider {
        name: &'static str,
        succeed: bool,
        calls: AtomicU32,
    }

    impl StubProvider {
        fn new(name: &'static str, succeed: bool) -> Self {
            Self {
                name,
                succeed,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ImageProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(
            &self,
            _prompt: &str,
            image_dir: &Path,
        ) -> Result<Vec<PathBuf>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                let path = image_dir.join(format!("{}.jpg", self.name));
                tokio::fs::write(&path, b"img").await?;
                Ok(vec![path])
            } else {
                Err(ProviderError::images("stub refused"))
            }
        }
    }

    fn test_pipeline(
        dir: &Path,
        planner_url: &str,
        acquisition: AcquisitionPlan,
    ) -> Arc<Pipeline> {
        let config = PipelineConfig {
            work_dir: dir.join("work"),
            cache_dir: dir.join("cache"),
            image_dir: dir.join("images"),
            ..PipelineConfig::default()
        };
        let planner = PlannerClient::new(planner_url, "test-key", "gpt-4o").unwrap();
        let tts = TtsClient::new("http://localhost:1", "test-key").unwrap();
        Arc::new(Pipeline::new(config, planner, tts, acquisition).unwrap())
    }

    fn dummy_acquisition() -> AcquisitionPlan {
        let provider: Arc<dyn ImageProvider> =
            Arc::new(HttpImageProvider::new("dummy", "http://localhost:1", None).unwrap());
        AcquisitionPlan::standard(Arc::clone(&provider), provider)
    }

    #[tokio::test]
    async fn test_empty_plan_fails_the_run() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "[]" } }]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(dir.path(), &server.uri(), dummy_acquisition());

        let err = pipeline
            .run("a story", PlanStyle::General, &dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoScenes));
    }

    #[tokio::test]
    async fn test_acquisition_falls_through_to_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let primary = Arc::new(StubProvider::new("primary", false));
        let fallback = Arc::new(StubProvider::new("fallback", true));
        let plan = AcquisitionPlan::standard(
            Arc::clone(&primary) as Arc<dyn ImageProvider>,
            Arc::clone(&fallback) as Arc<dyn ImageProvider>,
        );
        let pipeline = test_pipeline(dir.path(), "http://localhost:1", plan);
        pipeline.config.ensure_dirs().unwrap();

        let sem = Semaphore::new(1);
        let paths = pipeline.acquire_images("a castle", &sem).await.unwrap();
        assert_eq!(paths.len(), 1);
        // Primary tried with both prompt variants before the fallback ran
        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_acquisition_reports_last_error_when_all_fail() {
        let dir = tempfile::tempdir().unwrap();
        let primary = Arc::new(StubProvider::new("primary", false));
        let fallback = Arc::new(StubProvider::new("fallback", false));
        let plan = AcquisitionPlan::standard(
            primary as Arc<dyn ImageProvider>,
            fallback as Arc<dyn ImageProvider>,
        );
        let pipeline = test_pipeline(dir.path(), "http://localhost:1", plan);
        pipeline.config.ensure_dirs().unwrap();

        let sem = Semaphore::new(1);
        let err = pipeline.acquire_images("a castle", &sem).await.unwrap_err();
        assert!(matches!(err, ProviderError::Images(_)));
    }

    #[tokio::test]
    async fn test_cached_images_survive_provider_outage() {
        let dir = tempfile::tempdir().unwrap();
        let good = Arc::new(StubProvider::new("good", true));
        let plan = AcquisitionPlan::standard(
            Arc::clone(&good) as Arc<dyn ImageProvider>,
            Arc::clone(&good) as Arc<dyn ImageProvider>,
        );
        let pipeline = test_pipeline(dir.path(), "http://localhost:1", plan);
        pipeline.config.ensure_dirs().unwrap();

        let sem = Semaphore::new(1);
        let first = pipeline
            .acquire_cached_images("a castle", &sem)
            .await
            .unwrap();
        assert_eq!(good.calls.load(Ordering::SeqCst), 1);

        // Same description hits the cache, no provider call
        let second = pipeline
            .acquire_cached_images("a castle", &sem)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(good.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_partition_keeps_surviving_scenes_in_order() {
        // Scene 2 lost its images; 1 and 3 rendered
        let outcomes = vec![
            SceneOutcome::rendered(1, PathBuf::from("/tmp/work/scene_1.mp4")),
            SceneOutcome::skipped(2, "no images"),
            SceneOutcome::rendered(3, PathBuf::from("/tmp/work/scene_3.mp4")),
        ];
        let (clips, included, skipped) = partition_outcomes(&outcomes);
        assert_eq!(
            clips,
            vec![
                PathBuf::from("/tmp/work/scene_1.mp4"),
                PathBuf::from("/tmp/work/scene_3.mp4"),
            ]
        );
        assert_eq!(included, vec![1, 3]);
        assert_eq!(skipped, vec![2]);
    }

    #[test]
    fn test_clips_ordered_by_scene_number_not_completion_order() {
        // Scenes finish 3, 1, 2; the final video must still run 1, 2, 3
        let mut outcomes = vec![
            SceneOutcome::rendered(3, PathBuf::from("/tmp/work/scene_3.mp4")),
            SceneOutcome::rendered(1, PathBuf::from("/tmp/work/scene_1.mp4")),
            SceneOutcome::rendered(2, PathBuf::from("/tmp/work/scene_2.mp4")),
        ];
        outcomes.sort_by_key(|o| o.scene_number);
        let (clips, included, skipped) = partition_outcomes(&outcomes);
        assert_eq!(
            clips,
            vec![
                PathBuf::from("/tmp/work/scene_1.mp4"),
                PathBuf::from("/tmp/work/scene_2.mp4"),
                PathBuf::from("/tmp/work/scene_3.mp4"),
            ]
        );
        assert_eq!(included, vec![1, 2, 3]);
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_milestones_follow_the_scene_state_machine() {
        assert_eq!(milestone(2, SceneState::AudioReady), "Scene 2 audio_ready");
        assert_eq!(milestone(2, SceneState::ImagesReady), "Scene 2 images_ready");
        assert_eq!(milestone(2, SceneState::Rendered), "Scene 2 rendered");
        assert_eq!(milestone(5, SceneState::Skipped), "Scene 5 skipped");
    }

    #[test]
    fn test_outcome_constructors() {
        let rendered = SceneOutcome::rendered(1, PathBuf::from("/tmp/scene_1.mp4"));
        assert!(rendered.state.is_rendered());
        assert!(rendered.clip.is_some());

        let skipped = SceneOutcome::skipped(2, "no images");
        assert_eq!(skipped.state, SceneState::Skipped);
        assert!(skipped.clip.is_none());

        let failed = SceneOutcome::failed(3, "boom");
        assert_eq!(failed.state, SceneState::Failed);
        assert!(failed.state.is_terminal());
    }
}
