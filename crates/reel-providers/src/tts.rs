//! Text-to-speech client.
//!
//! Posts SSML to an HTTP synthesis endpoint and writes the returned audio to
//! the caller's path. Plain narration is wrapped into sentence-paced SSML
//! before synthesis.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ProviderError, ProviderResult};

/// Default request timeout for synthesis calls.
const TTS_TIMEOUT_SECS: u64 = 60;

/// Voice selection and audio shaping parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// BCP-47 language code
    pub language_code: String,
    /// Provider voice name
    pub name: String,
    /// Voice gender hint
    pub gender: String,
    /// Speaking rate multiplier
    pub speaking_rate: f32,
    /// Pitch adjustment in semitones
    pub pitch: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language_code: "en-IN".to_string(),
            name: "en-IN-Wavenet-A".to_string(),
            gender: "MALE".to_string(),
            speaking_rate: 1.0,
            pitch: 0.0,
        }
    }
}

/// Synthesis request body.
#[derive(Debug, Serialize)]
struct SynthesizeRequest {
    input: SynthesisInput,
    voice: VoiceSelection,
    #[serde(rename = "audioConfig")]
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput {
    ssml: String,
}

#[derive(Debug, Serialize)]
struct VoiceSelection {
    #[serde(rename = "languageCode")]
    language_code: String,
    name: String,
    #[serde(rename = "ssmlGender")]
    ssml_gender: String,
}

#[derive(Debug, Serialize)]
struct AudioConfig {
    #[serde(rename = "audioEncoding")]
    audio_encoding: String,
    #[serde(rename = "speakingRate")]
    speaking_rate: f32,
    pitch: f32,
}

/// Synthesis response body: base64-encoded audio.
#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    #[serde(rename = "audioContent")]
    audio_content: String,
}

/// HTTP text-to-speech client.
pub struct TtsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TtsClient {
    /// Create a TTS client.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TTS_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Create a TTS client from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let base_url = std::env::var("TTS_BASE_URL")
            .unwrap_or_else(|_| "https://texttospeech.googleapis.com".to_string());
        let api_key =
            std::env::var("TTS_API_KEY").map_err(|_| ProviderError::config("TTS_API_KEY not set"))?;
        Self::new(base_url, api_key)
    }

    /// Synthesize `text` (SSML or plain) to an audio file at `output`.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceConfig,
        output: &Path,
    ) -> ProviderResult<PathBuf> {
        let ssml = convert_to_ssml(text);

        let request = SynthesizeRequest {
            input: SynthesisInput { ssml },
            voice: VoiceSelection {
                language_code: voice.language_code.clone(),
                name: voice.name.clone(),
                ssml_gender: voice.gender.clone(),
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3".to_string(),
                speaking_rate: voice.speaking_rate,
                pitch: voice.pitch,
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/text:synthesize", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::tts(format!(
                "Synthesis endpoint returned {}: {}",
                status, body
            )));
        }

        let body: SynthesizeResponse = response.json().await?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(&body.audio_content)
            .map_err(|e| ProviderError::bad_response(format!("Invalid audio payload: {}", e)))?;

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, &audio).await?;

        info!("Audio saved to {}", output.display());
        Ok(output.to_path_buf())
    }
}

/// Wrap plain text into sentence-paced SSML. Text that already carries a
/// `<speak>` root is passed through unchanged.
pub fn convert_to_ssml(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with("<speak") {
        return trimmed.to_string();
    }

    let mut body = String::new();
    let mut sentence = String::new();
    for ch in trimmed.chars() {
        sentence.push(ch);
        if matches!(ch, '.' | '?' | '!') {
            let s = sentence.trim();
            if !s.is_empty() {
                body.push_str(s);
                body.push_str(" <break time=\"0.5s\"/> ");
            }
            sentence.clear();
        }
    }
    let tail = sentence.trim();
    if !tail.is_empty() {
        body.push_str(tail);
        body.push_str(" <break time=\"0.5s\"/> ");
    }

    format!("<speak>{}</speak>", body.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_convert_plain_text() {
        let ssml = convert_to_ssml("Hello there. How are you?");
        assert!(ssml.starts_with("<speak>"));
        assert!(ssml.ends_with("</speak>"));
        assert_eq!(ssml.matches("<break time=\"0.5s\"/>").count(), 2);
    }

    #[test]
    fn test_convert_passes_through_ssml() {
        let input = "<speak>Already marked up</speak>";
        assert_eq!(convert_to_ssml(input), input);
    }

    #[test]
    fn test_convert_handles_trailing_fragment() {
        let ssml = convert_to_ssml("No terminal punctuation");
        assert!(ssml.contains("No terminal punctuation"));
        assert_eq!(ssml.matches("<break").count(), 1);
    }

    #[tokio::test]
    async fn test_synthesize_writes_decoded_audio() {
        let server = MockServer::start().await;
        let audio_b64 = base64::engine::general_purpose::STANDARD.encode(b"mp3-data");
        Mock::given(method("POST"))
            .and(path("/v1/text:synthesize"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "audioContent": audio_b64 })),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("scene_1.mp3");
        let client = TtsClient::new(server.uri(), "test-key").unwrap();

        let written = client
            .synthesize("Hello.", &VoiceConfig::default(), &output)
            .await
            .unwrap();
        assert_eq!(written, output);
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"mp3-data");
    }

    #[tokio::test]
    async fn test_synthesize_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text:synthesize"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = TtsClient::new(server.uri(), "test-key").unwrap();
        let err = client
            .synthesize("Hello.", &VoiceConfig::default(), &dir.path().join("a.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Tts(_)));
    }
}
