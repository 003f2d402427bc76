//! Text-to-speech and music client for reels.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::ai_gateway::GatewayError;
use crate::config::AudioSettings;
use crate::error::{AppError, AppResult};

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Music composition can take well over a minute.
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(240);
const LOGGED_BODY_LIMIT: usize = 500;

const TTS_MODEL: &str = "eleven_multilingual_v2";
const TTS_OUTPUT_FORMAT: &str = "mp3_44100_128";
const API_KEY_HEADER: &str = "xi-api-key";

/// Audio generation seam.
#[async_trait]
pub trait AudioSynthesizer: Send + Sync {
    /// Spoken MP3 for `text`.
    async fn text_to_speech(&self, text: &str) -> Result<Vec<u8>, GatewayError>;

    /// Instrumental MP3 of roughly `duration_secs` seconds.
    async fn compose_music(&self, prompt: &str, duration_secs: u32)
    -> Result<Vec<u8>, GatewayError>;
}

/// HTTP implementation of [`AudioSynthesizer`].
#[derive(Clone)]
pub struct SpeechStudio {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    voice_id: String,
}

impl SpeechStudio {
    pub fn new(settings: &AudioSettings) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            voice_id: settings.voice_id.clone(),
        })
    }

    async fn post_for_audio(
        &self,
        url: &str,
        body: &serde_json::Value,
        what: &str,
    ) -> Result<Vec<u8>, GatewayError> {
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body: String = text.chars().take(LOGGED_BODY_LIMIT).collect();
            warn!(what, status = status.as_u16(), %body, "Audio call failed");
            return Err(GatewayError::from_status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if bytes.is_empty() {
            return Err(GatewayError::Decode(format!("{} returned no audio", what)));
        }

        debug!(what, bytes = bytes.len(), "Audio generated");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl AudioSynthesizer for SpeechStudio {
    async fn text_to_speech(&self, text: &str) -> Result<Vec<u8>, GatewayError> {
        let url = format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.base_url,
            urlencoding::encode(&self.voice_id),
            TTS_OUTPUT_FORMAT
        );
        let body = serde_json::json!({
            "text": text,
            "model_id": TTS_MODEL,
            "voice_settings": {
                "stability": 0.6,
                "similarity_boost": 0.75,
                "style": 0.4,
                "use_speaker_boost": true,
            },
        });
        self.post_for_audio(&url, &body, "voiceover").await
    }

    async fn compose_music(
        &self,
        prompt: &str,
        duration_secs: u32,
    ) -> Result<Vec<u8>, GatewayError> {
        let url = format!("{}/v1/music", self.base_url);
        let body = serde_json::json!({
            "prompt": prompt,
            "music_length_ms": duration_secs * 1000,
        });
        self.post_for_audio(&url, &body, "music").await
    }
}
