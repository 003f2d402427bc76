//! Image and caption generation calls.
//!
//! Gateway replies are classified once, here, into [`ImageGenerationOutcome`];
//! the rest of the pipeline never looks at raw responses.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{info, warn};

use super::ai_gateway::{ChatReply, ChatRequest, GatewayError, GenerativeModel};
use super::json_text::first_balanced_object;
use super::retry::retry_bounded;
use crate::error::{AppError, AppResult};
use crate::models::Captions;

/// Attempts for image generation: the first call plus one retry.
pub const IMAGE_MAX_ATTEMPTS: u32 = 2;
/// Captions are best-effort and never retried.
pub const CAPTION_MAX_ATTEMPTS: u32 = 1;

const INLINE_IMAGE_TYPES: [&str; 4] = ["png", "jpeg", "jpg", "webp"];

/// Decoded image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Result of a single image generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageGenerationOutcome {
    Success(GeneratedImage),
    /// The call succeeded but carried no usable inline image
    NoImage,
    HttpError { status: u16 },
    Transport(String),
}

impl ImageGenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    fn from_reply(reply: Result<ChatReply, GatewayError>) -> Self {
        match reply {
            Ok(reply) => reply
                .images
                .iter()
                .find_map(|url| decode_inline_image(url))
                .map(Self::Success)
                .unwrap_or(Self::NoImage),
            Err(err) => match err.status() {
                Some(status) => Self::HttpError { status },
                None => Self::Transport(err.to_string()),
            },
        }
    }
}

/// Decode `data:image/{png|jpeg|jpg|webp};base64,...` into non-empty bytes.
pub fn decode_inline_image(data_url: &str) -> Option<GeneratedImage> {
    let rest = data_url.trim().strip_prefix("data:image/")?;
    let (subtype, payload) = rest.split_once(";base64,")?;
    let subtype = subtype.to_ascii_lowercase();
    if !INLINE_IMAGE_TYPES.contains(&subtype.as_str()) {
        return None;
    }

    let bytes = STANDARD.decode(payload.trim()).ok()?;
    if bytes.is_empty() {
        return None;
    }

    let mime_type = if subtype == "jpg" {
        "image/jpeg".to_string()
    } else {
        format!("image/{}", subtype)
    };

    Some(GeneratedImage { bytes, mime_type })
}

/// Generate one image from `prompt` and the reference images.
///
/// A failed attempt is retried once with identical inputs. When both attempts
/// fail, a final 429 or 402 surfaces as `RateLimited` / `QuotaExhausted`;
/// anything else is a soft failure (`Ok(None)`).
pub async fn generate_image(
    model: &dyn GenerativeModel,
    image_model: &str,
    prompt: &str,
    reference_urls: &[String],
) -> AppResult<Option<GeneratedImage>> {
    let request = ChatRequest::text(image_model, prompt)
        .with_images(reference_urls.iter().cloned())
        .wanting_image();

    let request = &request;
    let result = retry_bounded(
        IMAGE_MAX_ATTEMPTS,
        move |attempt| async move {
            let outcome = ImageGenerationOutcome::from_reply(model.complete(request).await);
            if !outcome.is_success() {
                warn!(attempt, outcome = %outcome_label(&outcome), "Image generation attempt failed");
            }
            outcome
        },
        ImageGenerationOutcome::is_success,
    )
    .await;

    match result.outcome {
        ImageGenerationOutcome::Success(image) => {
            info!(
                attempts = result.attempts,
                bytes = image.bytes.len(),
                mime = %image.mime_type,
                "Image generated"
            );
            Ok(Some(image))
        }
        ImageGenerationOutcome::HttpError { status: 429 } => Err(AppError::RateLimited),
        ImageGenerationOutcome::HttpError { status: 402 } => Err(AppError::QuotaExhausted),
        other => {
            warn!(
                attempts = result.attempts,
                outcome = %outcome_label(&other),
                "Image generation gave up"
            );
            Ok(None)
        }
    }
}

/// Short outcome description for logs, without image bytes.
fn outcome_label(outcome: &ImageGenerationOutcome) -> String {
    match outcome {
        ImageGenerationOutcome::Success(_) => "success".to_string(),
        ImageGenerationOutcome::NoImage => "no_image".to_string(),
        ImageGenerationOutcome::HttpError { status } => format!("http_{}", status),
        ImageGenerationOutcome::Transport(msg) => format!("transport: {}", msg),
    }
}

/// Generate English and Hindi captions for a garment photo.
///
/// Upstream failures yield empty captions; captions never block delivery.
pub async fn generate_captions(
    model: &dyn GenerativeModel,
    caption_model: &str,
    source_image_url: &str,
    context: &[String],
) -> Captions {
    let request = ChatRequest::text(caption_model, caption_prompt(context))
        .with_images([source_image_url.to_string()]);

    let request = &request;
    let result = retry_bounded(
        CAPTION_MAX_ATTEMPTS,
        move |_| model.complete(request),
        |reply: &Result<ChatReply, GatewayError>| reply.is_ok(),
    )
    .await;

    match result.outcome {
        Ok(reply) => parse_captions(&reply.text),
        Err(err) => {
            warn!(error = %err, "Caption generation failed, using empty captions");
            Captions::default()
        }
    }
}

fn caption_prompt(context: &[String]) -> String {
    let mut prompt = String::from(
        "Write a short social media caption for this Indian ethnic wear garment photo, \
         once in English and once in Hindi (Devanagari script). Mention the fabric, \
         colors and occasion. Keep each caption under 60 words with at most three hashtags.\n",
    );

    if !context.is_empty() {
        prompt.push_str("\nGarment details:\n");
        for line in context {
            prompt.push_str("- ");
            prompt.push_str(line);
            prompt.push('\n');
        }
    }

    prompt.push_str(
        "\nRespond with only this JSON object and nothing else:\n\
         {\"english\": \"...\", \"hindi\": \"...\"}",
    );
    prompt
}

/// Parse a caption reply.
///
/// The first balanced `{...}` is decoded as `{"english", "hindi"}`. When that
/// fails the whole reply becomes the English caption and Hindi stays empty.
pub fn parse_captions(raw: &str) -> Captions {
    let parsed = first_balanced_object(raw)
        .and_then(|candidate| serde_json::from_str::<serde_json::Value>(candidate).ok())
        .and_then(|value| {
            let field = |key: &str| value.get(key).and_then(|v| v.as_str()).map(str::trim);
            match (field("english"), field("hindi")) {
                (None, None) => None,
                (english, hindi) => Some(Captions {
                    primary: english.unwrap_or_default().to_string(),
                    secondary: hindi.unwrap_or_default().to_string(),
                }),
            }
        });

    parsed.unwrap_or_else(|| Captions {
        primary: raw.to_string(),
        secondary: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_decode_inline_image_types() {
        let png = decode_inline_image(PNG_DATA_URL).unwrap();
        assert_eq!(png.mime_type, "image/png");
        assert!(!png.bytes.is_empty());

        let jpg = decode_inline_image("data:image/jpg;base64,/9j/4AA=").unwrap();
        assert_eq!(jpg.mime_type, "image/jpeg");

        assert!(decode_inline_image("data:image/gif;base64,R0lGOD==").is_none());
        assert!(decode_inline_image("data:image/png;base64,").is_none());
        assert!(decode_inline_image("https://cdn.example/a.png").is_none());
        assert!(decode_inline_image("data:image/png;base64,***").is_none());
    }

    #[test]
    fn test_parse_captions_from_fenced_json() {
        let raw = "```json\n{\"english\": \"Elegant navy silk\", \"hindi\": \"सुंदर नीला रेशम\"}\n```";
        let captions = parse_captions(raw);
        assert_eq!(captions.primary, "Elegant navy silk");
        assert_eq!(captions.secondary, "सुंदर नीला रेशम");
    }

    #[test]
    fn test_prose_falls_back_to_primary() {
        let raw = "A lovely festive kurta in soft pastel shades.";
        let captions = parse_captions(raw);
        assert_eq!(captions.primary, raw);
        assert_eq!(captions.secondary, "");
    }

    #[test]
    fn test_parse_captions_is_idempotent() {
        for raw in [
            "{\"english\": \"a\", \"hindi\": \"b\"}",
            "not json {broken",
            "{\"other\": 1}",
        ] {
            assert_eq!(parse_captions(raw), parse_captions(raw));
        }
    }

    #[tokio::test]
    async fn test_failed_image_retried_exactly_once() {
        let model = ScriptedModel::new().image_replies(vec![
            Ok(ChatReply::default()),
            Ok(ChatReply::default()),
            Ok(ChatReply {
                text: String::new(),
                images: vec![PNG_DATA_URL.to_string()],
            }),
        ]);

        let image = generate_image(&model, "img", "prompt", &[]).await.unwrap();
        assert!(image.is_none());
        assert_eq!(model.image_calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_recovers_on_second_attempt() {
        let model = ScriptedModel::new().image_replies(vec![
            Err(GatewayError::Status(500)),
            Ok(ChatReply {
                text: String::new(),
                images: vec![PNG_DATA_URL.to_string()],
            }),
        ]);

        let image = generate_image(&model, "img", "prompt", &[]).await.unwrap();
        assert!(image.is_some());
        assert_eq!(model.image_calls(), 2);
    }

    #[tokio::test]
    async fn test_success_is_not_retried() {
        let model = ScriptedModel::new().image_replies(vec![Ok(ChatReply {
            text: String::new(),
            images: vec![PNG_DATA_URL.to_string()],
        })]);

        generate_image(&model, "img", "prompt", &[]).await.unwrap();
        assert_eq!(model.image_calls(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_and_quota_surface_after_retry() {
        let model = ScriptedModel::new().image_replies(vec![
            Err(GatewayError::RateLimited),
            Err(GatewayError::RateLimited),
        ]);
        let err = generate_image(&model, "img", "prompt", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited));
        assert_eq!(model.image_calls(), 2);

        let model = ScriptedModel::new().image_replies(vec![
            Err(GatewayError::Transport("reset".to_string())),
            Err(GatewayError::QuotaExhausted),
        ]);
        let err = generate_image(&model, "img", "prompt", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::QuotaExhausted));
    }

    #[tokio::test]
    async fn test_caption_upstream_error_yields_empty_captions() {
        let model = ScriptedModel::new().caption_replies(vec![Err(GatewayError::Status(500))]);
        let captions = generate_captions(&model, "cap", "https://cdn.example/s.jpg", &[]).await;
        assert_eq!(captions, Captions::default());
        assert_eq!(model.caption_calls(), 1);
    }
}
