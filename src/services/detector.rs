//! Label detection for multi-fabric photos (`detect` action).

use tracing::{info, warn};
use uuid::Uuid;

use super::ai_gateway::{ChatRequest, GenerativeModel};
use super::json_text::{outermost_object, parse_embedded_object};
use super::pipeline::{Pipeline, advance_job, fail_job};
use crate::error::{AppError, AppResult};
use crate::models::{DetectedLabels, JobStatus};

const DETECTION_PROMPT: &str = "This photo shows fabric swatches that a seller marked with \
letter labels: T = top (kurta/blouse) fabric, D = dupatta, B = bottom fabric, C = a color \
variant of the same design. Identify every labeled piece. Respond with only a JSON object:\n\
{\"pieces\": [{\"label\": \"T\", \"description\": \"color, print and texture\", \"position\": \
\"where it is in the photo\"}], \"sample_count\": <number of distinct outfits to generate>, \
\"has_bottom\": <true if a B piece exists>, \"color_variants\": [\"one short color name per C \
piece\"], \"summary\": \"one sentence\"}";

/// One vision call; returns normalized labels.
pub async fn detect_labels(
    model: &dyn GenerativeModel,
    vision_model: &str,
    source_image_url: &str,
) -> AppResult<DetectedLabels> {
    let request =
        ChatRequest::text(vision_model, DETECTION_PROMPT).with_images([source_image_url.to_string()]);

    let reply = model.complete(&request).await?;

    let value = outermost_object(&reply.text)
        .and_then(|span| serde_json::from_str::<serde_json::Value>(span).ok())
        .filter(|v| v.is_object())
        .or_else(|| parse_embedded_object(&reply.text))
        .ok_or_else(|| {
            warn!(reply_len = reply.text.len(), "Label detection returned no JSON");
            AppError::Upstream("label detection returned no JSON object".to_string())
        })?;

    Ok(DetectedLabels::from_value(&value).normalized())
}

/// Create a job for `source_image_url`, detect its labels and store them.
pub async fn run_detection(
    pipeline: &Pipeline,
    user_id: Uuid,
    source_image_url: Option<&str>,
) -> AppResult<(Uuid, DetectedLabels)> {
    let source_image_url = source_image_url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::InvalidInput("sourceImageUrl is required".to_string()))?;

    let repo = pipeline.repo.as_ref();
    let job = repo.insert_multi_fabric_job(user_id, source_image_url).await?;
    let status = advance_job(repo, job.id, job.status, JobStatus::Analyzing, None).await?;

    let labels = match detect_labels(
        pipeline.model.as_ref(),
        &pipeline.models.vision_model,
        source_image_url,
    )
    .await
    {
        Ok(labels) => labels,
        Err(e) => {
            fail_job(repo, job.id, status, &e.to_string()).await;
            return Err(e);
        }
    };

    status
        .transition(JobStatus::Detected)
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    repo.save_detected_labels(job.id, &labels).await?;

    info!(
        job_id = %job.id,
        pieces = labels.pieces.len(),
        sample_count = labels.sample_count,
        color_variants = labels.color_variants.len(),
        "Labels detected"
    );

    Ok((job.id, labels))
}
