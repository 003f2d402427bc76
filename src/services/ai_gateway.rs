//! Client for the generative gateway (OpenAI-compatible chat completions).
//!
//! The gateway serves the image model, the caption model and the vision model
//! used by the classifier and label detector. Callers translate
//! [`GatewayError`] into their own outcome types; raw upstream bodies are only
//! logged.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::AiSettings;
use crate::error::{AppError, AppResult};

/// HTTP connect timeout for gateway calls.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// HTTP total timeout. Image generation regularly takes close to a minute.
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);
/// Upstream error bodies are cut to this many characters before logging.
const LOGGED_BODY_LIMIT: usize = 500;

/// One multimodal chat request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub prompt: String,
    /// Reference images, attached in order after the prompt
    pub image_urls: Vec<String>,
    /// Ask for image output in addition to text
    pub want_image: bool,
}

impl ChatRequest {
    pub fn text(model: &str, prompt: impl Into<String>) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.into(),
            image_urls: Vec::new(),
            want_image: false,
        }
    }

    pub fn with_images(mut self, urls: impl IntoIterator<Item = String>) -> Self {
        self.image_urls.extend(urls);
        self
    }

    pub fn wanting_image(mut self) -> Self {
        self.want_image = true;
        self
    }
}

/// Parsed reply: text content plus any inline images as data URLs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub images: Vec<String>,
}

/// Gateway failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("rate limited")]
    RateLimited,
    #[error("credits exhausted")]
    QuotaExhausted,
    #[error("upstream status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// HTTP status the upstream answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited => Some(429),
            Self::QuotaExhausted => Some(402),
            Self::Status(code) => Some(*code),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            402 => Self::QuotaExhausted,
            other => Self::Status(other),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::RateLimited => AppError::RateLimited,
            GatewayError::QuotaExhausted => AppError::QuotaExhausted,
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// Multimodal model seam.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, GatewayError>;
}

/// HTTP implementation of [`GenerativeModel`].
#[derive(Clone)]
pub struct AiGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl AiGateway {
    pub fn new(settings: &AiSettings) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl GenerativeModel for AiGateway {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, GatewayError> {
        let body = request_body(request);
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(
                model = %request.model,
                status = status.as_u16(),
                body = %truncate(&text, LOGGED_BODY_LIMIT),
                "Gateway call failed"
            );
            return Err(GatewayError::from_status(status.as_u16()));
        }

        let raw: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let reply = parse_completion(raw);
        debug!(
            model = %request.model,
            text_len = reply.text.len(),
            images = reply.images.len(),
            "Gateway call completed"
        );
        Ok(reply)
    }
}

/// JSON body for a chat completion.
fn request_body(request: &ChatRequest) -> serde_json::Value {
    let mut content = vec![serde_json::json!({ "type": "text", "text": request.prompt })];
    content.extend(request.image_urls.iter().map(|url| {
        serde_json::json!({ "type": "image_url", "image_url": { "url": url } })
    }));

    let mut body = serde_json::json!({
        "model": request.model,
        "messages": [{ "role": "user", "content": content }],
    });
    if request.want_image {
        body["modalities"] = serde_json::json!(["image", "text"]);
    }
    body
}

#[derive(Debug, Default, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Default, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Message,
}

#[derive(Debug, Default, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<serde_json::Value>,
    #[serde(default)]
    images: Vec<ImagePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ImagePart {
    #[serde(default)]
    image_url: Option<ImageUrl>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageUrl {
    #[serde(default)]
    url: String,
}

/// Flatten the first choice. Content may be a string or a list of parts.
fn parse_completion(raw: CompletionResponse) -> ChatReply {
    let Some(choice) = raw.choices.into_iter().next() else {
        return ChatReply::default();
    };

    let text = match choice.message.content {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Array(parts)) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    };

    let images = choice
        .message
        .images
        .into_iter()
        .filter_map(|part| part.image_url.map(|u| u.url))
        .filter(|url| !url.is_empty())
        .collect();

    ChatReply { text, images }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_attaches_images_after_prompt() {
        let request = ChatRequest::text("img-model", "drape it")
            .with_images(vec!["https://a/src.jpg".to_string(), "https://a/bg.jpg".to_string()])
            .wanting_image();
        let body = request_body(&request);

        let content = body["messages"][0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 3);
        assert_eq!(content[0]["text"], "drape it");
        assert_eq!(content[2]["image_url"]["url"], "https://a/bg.jpg");
        assert_eq!(body["modalities"], serde_json::json!(["image", "text"]));
    }

    #[test]
    fn test_text_request_has_no_modalities() {
        let body = request_body(&ChatRequest::text("caption-model", "hello"));
        assert!(body.get("modalities").is_none());
    }

    #[test]
    fn test_parse_completion_reads_text_and_images() {
        let raw: CompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [{
                "message": {
                    "content": "here you go",
                    "images": [{"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}]
                }
            }]
        }))
        .unwrap();

        let reply = parse_completion(raw);
        assert_eq!(reply.text, "here you go");
        assert_eq!(reply.images, vec!["data:image/png;base64,AAAA"]);
    }

    #[test]
    fn test_parse_completion_without_choices() {
        let reply = parse_completion(CompletionResponse::default());
        assert_eq!(reply, ChatReply::default());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::from_status(429), GatewayError::RateLimited);
        assert_eq!(GatewayError::from_status(402), GatewayError::QuotaExhausted);
        assert_eq!(GatewayError::from_status(503).status(), Some(503));
        assert!(matches!(
            AppError::from(GatewayError::Status(500)),
            AppError::Upstream(_)
        ));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("नमस्ते दुनिया", 3).chars().count(), 3);
        assert_eq!(truncate("short", 10), "short");
    }
}
