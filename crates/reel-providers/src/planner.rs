//! Scene planner client.
//!
//! Splits the story into chunks, asks an OpenAI-compatible chat completion
//! endpoint for a JSON scene list per chunk, and renumbers the results into
//! one ordered plan. Chat responses are cached per chunk so replanning the
//! same story is free.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use reel_cache::Cache;
use reel_models::Scene;

use crate::error::{ProviderError, ProviderResult};

/// Maximum characters per planning chunk.
pub const MAX_CHUNK_CHARS: usize = 2000;

/// Default request timeout for planner calls.
const PLANNER_TIMEOUT_SECS: u64 = 120;

/// Prompt style for scene planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStyle {
    /// Consistent-character visual prompts for illustrated stories.
    Kids,
    /// General narration with SSML markup in `ttl`.
    General,
}

impl PlanStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStyle::Kids => "kids",
            PlanStyle::General => "general",
        }
    }
}

impl std::str::FromStr for PlanStyle {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kids" => Ok(PlanStyle::Kids),
            "general" => Ok(PlanStyle::General),
            other => Err(ProviderError::config(format!("Unknown plan style: {}", other))),
        }
    }
}

/// Chat completion request.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Scene planner over an OpenAI-compatible chat endpoint.
pub struct PlannerClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl PlannerClient {
    /// Create a planner client.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(PLANNER_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Create a planner client from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let base_url = std::env::var("PLANNER_BASE_URL")
            .unwrap_or_else(|_| "https://models.inference.ai.azure.com".to_string());
        let api_key = std::env::var("PLANNER_API_KEY")
            .map_err(|_| ProviderError::config("PLANNER_API_KEY not set"))?;
        let model = std::env::var("PLANNER_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        Self::new(base_url, api_key, model)
    }

    /// Plan scenes for a story.
    ///
    /// The story is chunked, each chunk planned with one cached chat call,
    /// and the per-chunk scene lists renumbered into a single ascending
    /// sequence. An empty story is an error.
    pub async fn plan(
        &self,
        story: &str,
        style: PlanStyle,
        cache: &Cache,
    ) -> ProviderResult<Vec<Scene>> {
        if story.trim().is_empty() {
            return Err(ProviderError::planner("Story input is required"));
        }

        let mut all_scenes: Vec<Scene> = Vec::new();

        for chunk in chunk_story(story, MAX_CHUNK_CHARS) {
            let offset = all_scenes.len() as u32;
            let prompt = build_prompt(style, &chunk);

            let content = cache
                .get_or_compute_json(&["plan", style.as_str(), &chunk], || async {
                    Ok(self.complete(&prompt).await?)
                })
                .await
                .map_err(|e| match e {
                    reel_cache::CacheError::Producer(inner) => match inner.downcast::<ProviderError>() {
                        Ok(provider_err) => provider_err,
                        Err(other) => ProviderError::planner(other.to_string()),
                    },
                    other => ProviderError::Cache(other),
                })?;

            let mut scenes = parse_scene_json(&content)?;
            // Renumber by position so model numbering quirks cannot break
            // the global ordering.
            for (i, scene) in scenes.iter_mut().enumerate() {
                scene.scene_number = offset + i as u32 + 1;
            }
            debug!("Planned {} scenes from chunk at offset {}", scenes.len(), offset);
            all_scenes.extend(scenes);
        }

        info!("Planned {} scenes total", all_scenes.len());
        Ok(all_scenes)
    }

    /// One chat completion call.
    async fn complete(&self, prompt: &str) -> ProviderResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You are a scriptwriter turning stories into video scenes.".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::planner(format!(
                "Planner endpoint returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| ProviderError::bad_response("No choices in planner response"))?;

        Ok(content)
    }
}

/// Split a story into chunks of at most `max_len` characters, breaking on
/// blank lines. Oversized paragraphs are truncated rather than split.
pub fn chunk_story(story: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();

    for para in story.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        if buffer.len() + 2 + para.len() > max_len {
            if !buffer.is_empty() {
                chunks.push(std::mem::take(&mut buffer));
            }
            buffer = if para.len() > max_len {
                truncate_at_char_boundary(para, max_len).to_string()
            } else {
                para.to_string()
            };
        } else if buffer.is_empty() {
            buffer = para.to_string();
        } else {
            buffer.push_str("\n\n");
            buffer.push_str(para);
        }
    }
    if !buffer.is_empty() {
        chunks.push(buffer);
    }
    chunks
}

fn truncate_at_char_boundary(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Parse the model's JSON scene array, tolerating markdown code fences.
fn parse_scene_json(content: &str) -> ProviderResult<Vec<Scene>> {
    let text = strip_code_fences(content);
    serde_json::from_str(text)
        .map_err(|e| ProviderError::bad_response(format!("Failed to parse scene JSON: {}", e)))
}

fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Build the planning prompt for one chunk.
fn build_prompt(style: PlanStyle, chunk: &str) -> String {
    match style {
        PlanStyle::General => format!(
            r#"Break the story below into sequential scenes for a narrated video.

Number scenes starting at 1. Each scene must include:
- "scene_number": sequential number
- "description": a short, specific visual description of the image to show
- "narration": the plain-text voice-over for the scene
- "ttl": an SSML version of the narration using <speak>, <prosody>, <emphasis> and <break> tags, kept natural

Respond only with a JSON array of scenes, no additional text.

Story:
"""
{chunk}
"""
"#,
            chunk = chunk
        ),
        PlanStyle::Kids => format!(
            r#"Break the story below into sequential scenes for an illustrated video.

Number scenes starting at 1. Each scene must include:
- "scene_number": sequential number
- "description": a self-contained image prompt under 500 characters. Re-describe every character's age, clothes, hair and mood and the surroundings in every scene so each prompt is independent but visually consistent with the others.
- "narration": the voice-over text, taken from the story in its original language, at least 200 characters where possible

Respond only with a JSON array of scenes, no additional text.

Story:
"""
{chunk}
"""
"#,
            chunk = chunk
        ),
    }
}
