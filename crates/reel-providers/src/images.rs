//! Image acquisition.
//!
//! Scenes get their visuals from an ordered list of strategies: a primary
//! provider with the original prompt, the same provider with a softened
//! prompt, then a rate-limited fallback provider. The orchestrator walks the
//! list until one strategy yields at least one image.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ProviderError, ProviderResult};

/// Default request timeout for image provider calls.
const IMAGES_TIMEOUT_SECS: u64 = 120;

/// How a scene description is turned into a provider prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVariant {
    /// The scene description as written.
    Original,
    /// The description with a family-friendly suffix, for retrying prompts
    /// the provider rejected on content grounds.
    Softened,
}

impl PromptVariant {
    pub fn apply(&self, description: &str) -> String {
        match self {
            PromptVariant::Original => description.to_string(),
            PromptVariant::Softened => {
                format!("{}. Please render fully family-friendly.", description)
            }
        }
    }
}

/// A source of images for a scene description.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Short name used in logs and skip reasons.
    fn name(&self) -> &str;

    /// Fetch images for `prompt`, writing them under `image_dir`.
    ///
    /// Returns the paths of the images that were written. An empty list is an
    /// error; providers report it as [`ProviderError::EmptyResult`].
    async fn generate(&self, prompt: &str, image_dir: &Path) -> ProviderResult<Vec<PathBuf>>;
}

/// Response from an HTTP image endpoint: a list of downloadable URLs.
#[derive(Debug, Deserialize)]
struct ImageListResponse {
    images: Vec<String>,
}

/// Image provider backed by an HTTP endpoint that returns image URLs.
pub struct HttpImageProvider {
    name: String,
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpImageProvider {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: Option<String>,
    ) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(IMAGES_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            name: name.into(),
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    /// Download one URL into `image_dir` with a fresh filename.
    async fn download(&self, url: &str, image_dir: &Path) -> ProviderResult<PathBuf> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::images(format!(
                "Download of {} returned {}",
                url,
                response.status()
            )));
        }
        let bytes = response.bytes().await?;
        let path = image_dir.join(format!("{}.jpg", Uuid::new_v4()));
        tokio::fs::write(&path, &bytes).await?;
        Ok(path)
    }
}

#[async_trait]
impl ImageProvider for HttpImageProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, image_dir: &Path) -> ProviderResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(image_dir).await?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "prompt": prompt }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::images(format!(
                "Image endpoint returned {}: {}",
                status, body
            )));
        }

        let listing: ImageListResponse = response.json().await?;
        if listing.images.is_empty() {
            return Err(ProviderError::EmptyResult);
        }

        // Individual download failures are tolerated as long as something
        // lands on disk.
        let mut paths = Vec::with_capacity(listing.images.len());
        for url in &listing.images {
            match self.download(url, image_dir).await {
                Ok(path) => paths.push(path),
                Err(e) => warn!(provider = %self.name, url = %url, "Image download failed: {}", e),
            }
        }

        if paths.is_empty() {
            return Err(ProviderError::EmptyResult);
        }
        info!(provider = %self.name, count = paths.len(), "Images acquired");
        Ok(paths)
    }
}

/// One rung of the acquisition ladder.
#[derive(Clone)]
pub struct AcquisitionStrategy {
    pub provider: Arc<dyn ImageProvider>,
    pub variant: PromptVariant,
    /// Strategies marked serialized run at most one at a time across all
    /// scenes.
    pub serialized: bool,
}

impl AcquisitionStrategy {
    pub fn label(&self) -> String {
        let variant = match self.variant {
            PromptVariant::Original => "original",
            PromptVariant::Softened => "softened",
        };
        format!("{}/{}", self.provider.name(), variant)
    }
}

/// Ordered list of strategies to try for each scene.
#[derive(Clone)]
pub struct AcquisitionPlan {
    strategies: Vec<AcquisitionStrategy>,
}

impl AcquisitionPlan {
    /// The standard ladder: primary with the prompt as written, primary with
    /// the softened prompt, then the serialized fallback.
    pub fn standard(primary: Arc<dyn ImageProvider>, fallback: Arc<dyn ImageProvider>) -> Self {
        Self {
            strategies: vec![
                AcquisitionStrategy {
                    provider: Arc::clone(&primary),
                    variant: PromptVariant::Original,
                    serialized: false,
                },
                AcquisitionStrategy {
                    provider: primary,
                    variant: PromptVariant::Softened,
                    serialized: false,
                },
                AcquisitionStrategy {
                    provider: fallback,
                    variant: PromptVariant::Original,
                    serialized: true,
                },
            ],
        }
    }

    pub fn strategies(&self) -> &[AcquisitionStrategy] {
        &self.strategies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_prompt_variants() {
        assert_eq!(PromptVariant::Original.apply("a red fox"), "a red fox");
        assert_eq!(
            PromptVariant::Softened.apply("a red fox"),
            "a red fox. Please render fully family-friendly."
        );
    }

    #[test]
    fn test_standard_plan_order() {
        let primary: Arc<dyn ImageProvider> = Arc::new(
            HttpImageProvider::new("primary", "http://localhost/x", None).unwrap(),
        );
        let fallback: Arc<dyn ImageProvider> = Arc::new(
            HttpImageProvider::new("fallback", "http://localhost/y", None).unwrap(),
        );
        let plan = AcquisitionPlan::standard(primary, fallback);
        let labels: Vec<_> = plan.strategies().iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec!["primary/original", "primary/softened", "fallback/original"]
        );
        assert!(!plan.strategies()[0].serialized);
        assert!(plan.strategies()[2].serialized);
    }

    #[tokio::test]
    async fn test_generate_downloads_listed_urls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "images": [
                    format!("{}/img/1.jpg", server.uri()),
                    format!("{}/img/2.jpg", server.uri()),
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/img/1.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"one".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/img/2.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"two".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let provider =
            HttpImageProvider::new("test", format!("{}/generate", server.uri()), None).unwrap();
        let paths = provider.generate("a red fox", dir.path()).await.unwrap();
        assert_eq!(paths.len(), 2);
        for path in &paths {
            assert!(path.exists());
        }
    }

    #[tokio::test]
    async fn test_generate_tolerates_partial_download_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "images": [
                    format!("{}/img/ok.jpg", server.uri()),
                    format!("{}/img/gone.jpg", server.uri()),
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/img/ok.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/img/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let provider =
            HttpImageProvider::new("test", format!("{}/generate", server.uri()), None).unwrap();
        let paths = provider.generate("a red fox", dir.path()).await.unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[tokio::test]
    async fn test_generate_empty_listing_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "images": [] })),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let provider =
            HttpImageProvider::new("test", format!("{}/generate", server.uri()), None).unwrap();
        let err = provider.generate("a red fox", dir.path()).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResult));
    }

    #[tokio::test]
    async fn test_generate_sends_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(body_json_string(r#"{"prompt":"a quiet lake"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "images": [format!("{}/img/1.jpg", server.uri())]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/img/1.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let provider =
            HttpImageProvider::new("test", format!("{}/generate", server.uri()), None).unwrap();
        provider.generate("a quiet lake", dir.path()).await.unwrap();
    }
}
