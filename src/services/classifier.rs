//! Human-presence classification of source photos.

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::ai_gateway::{ChatRequest, GenerativeModel};
use super::json_text::first_balanced_object;

const CLASSIFIER_PROMPT: &str = "Look at this photo. Is a real human being (a person or model, \
even partially visible) wearing the garment? Mannequins, dress forms and flat-laid fabric do \
not count. Answer with only this JSON: {\"has_model\": true} or {\"has_model\": false}";

/// Whether a person is wearing the garment in `image_url`.
///
/// Errors, non-success replies and unparseable answers all mean `false`.
pub async fn detect_human_presence(
    model: &dyn GenerativeModel,
    vision_model: &str,
    image_url: &str,
) -> bool {
    let request =
        ChatRequest::text(vision_model, CLASSIFIER_PROMPT).with_images([image_url.to_string()]);

    let reply = match model.complete(&request).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(error = %err, "Human detection failed, assuming no model");
            return false;
        }
    };

    match parse_has_model(&reply.text) {
        Some(has_model) => {
            debug!(has_model, "Human detection finished");
            has_model
        }
        None => {
            warn!("Human detection reply was not understood, assuming no model");
            false
        }
    }
}

/// Read `has_model` from the first JSON object in `text`.
pub fn parse_has_model(text: &str) -> Option<bool> {
    let value: JsonValue = serde_json::from_str(first_balanced_object(text)?).ok()?;

    match value.get("has_model")? {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) => Some(matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "1"
        )),
        JsonValue::Number(n) => Some(n.as_i64() == Some(1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai_gateway::{ChatReply, GatewayError};
    use crate::testing::ScriptedModel;

    #[test]
    fn test_lenient_has_model_values() {
        assert_eq!(parse_has_model("{\"has_model\": true}"), Some(true));
        assert_eq!(parse_has_model("Answer: {\"has_model\": \"yes\"}"), Some(true));
        assert_eq!(parse_has_model("{\"has_model\": 1}"), Some(true));
        assert_eq!(parse_has_model("{\"has_model\": \"no\"}"), Some(false));
        assert_eq!(parse_has_model("{\"other\": true}"), None);
        assert_eq!(parse_has_model("yes there is a model"), None);
    }

    #[tokio::test]
    async fn test_upstream_error_means_no_model() {
        let model = ScriptedModel::new().vision_replies(vec![Err(GatewayError::Status(503))]);
        assert!(!detect_human_presence(&model, "vision", "https://cdn.example/a.jpg").await);
    }

    #[tokio::test]
    async fn test_positive_answer() {
        let model = ScriptedModel::new().vision_replies(vec![Ok(ChatReply {
            text: "```json\n{\"has_model\": true}\n```".to_string(),
            images: vec![],
        })]);
        assert!(detect_human_presence(&model, "vision", "https://cdn.example/a.jpg").await);
    }
}
