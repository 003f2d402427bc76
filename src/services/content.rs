//! Single-job generation: one fabric photo in, one on-model image and a pair
//! of captions out.

use tracing::{info, warn};
use uuid::Uuid;

use super::classifier::detect_human_presence;
use super::invoker::{generate_captions, generate_image};
use super::pipeline::Pipeline;
use super::prompts::{PromptContext, build_image_prompt, select_template};
use super::reconciler::finalize_content;
use super::resolver::resolve_background;
use super::storage::{extension_for_content_type, generated_image_key};
use crate::error::{AppError, AppResult};
use crate::models::{
    Captions, ContentWrite, GenerateContentRequest, GenerateContentResponse, ResultStatus,
    UploadKind,
};

/// Message returned when both image attempts came back without an image.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate image. Please try again.";

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Generate (or regenerate) content for one fabric upload.
pub async fn generate_content(
    pipeline: &Pipeline,
    user_id: Uuid,
    request: GenerateContentRequest,
) -> AppResult<GenerateContentResponse> {
    let source_id = request
        .source_id
        .ok_or_else(|| AppError::InvalidInput("sourceId is required".to_string()))?;
    let source_image_url = non_blank(request.source_image_url.as_deref())
        .ok_or_else(|| AppError::InvalidInput("sourceImageUrl is required".to_string()))?;

    let repo = pipeline.repo.as_ref();

    let fabric = repo
        .find_fabric_image(user_id, source_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Fabric image".to_string()))?;

    if let Some(result_id) = request.result_id {
        let existing = repo
            .find_generated_content(user_id, result_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Content {}", result_id)))?;
        if existing.fabric_id != fabric.id {
            return Err(AppError::InvalidInput(format!(
                "Content {} was not generated from fabric {}",
                result_id, fabric.id
            )));
        }
    }

    let upload_kind = request.upload_kind.unwrap_or(fabric.upload_type);
    if upload_kind == UploadKind::LabeledMultiFabric {
        return Err(AppError::InvalidInput(
            "Labeled multi-fabric photos are generated through /multi-fabric".to_string(),
        ));
    }
    let custom_prompt = non_blank(request.custom_instructions.as_deref());
    let mannequin_url = non_blank(request.mannequin_reference_url.as_deref());
    let background_url = resolve_background(
        repo,
        pipeline.picker.as_ref(),
        user_id,
        request.background_image_url.as_deref(),
    )
    .await?;

    let has_human_model = match upload_kind {
        UploadKind::Fabric => {
            detect_human_presence(
                pipeline.model.as_ref(),
                &pipeline.models.vision_model,
                &source_image_url,
            )
            .await
        }
        _ => false,
    };

    let ctx = PromptContext {
        custom_prompt: custom_prompt.clone(),
        background_provided: background_url.is_some(),
        mannequin_reference_provided: mannequin_url.is_some(),
        ..PromptContext::for_source_photo(upload_kind, has_human_model)
    };
    let prompt = build_image_prompt(&ctx);

    info!(
        %user_id,
        fabric_id = %fabric.id,
        upload_kind = upload_kind.as_str(),
        template = ?select_template(&ctx),
        regenerate = request.result_id.is_some(),
        background = background_url.is_some(),
        "Generating content"
    );

    let mut references = vec![source_image_url.clone()];
    references.extend(mannequin_url.iter().cloned());
    references.extend(background_url.iter().cloned());

    let image = generate_image(
        pipeline.model.as_ref(),
        &pipeline.models.image_model,
        &prompt,
        &references,
    )
    .await?;

    let Some(image) = image else {
        warn!(%user_id, fabric_id = %fabric.id, "No image after retry, recording failed generation");
        let write = ContentWrite {
            fabric_id: fabric.id,
            model_image_url: None,
            background_image_url: background_url,
            captions: Captions::default(),
            generation_status: ResultStatus::Failed,
            error_message: Some(GENERATION_FAILED_MESSAGE.to_string()),
        };
        finalize_content(repo, user_id, request.result_id, &write).await?;
        return Err(AppError::GenerationFailed(GENERATION_FAILED_MESSAGE.to_string()));
    };

    let key = generated_image_key(
        user_id,
        "model",
        extension_for_content_type(&image.mime_type),
    );
    let image_url = pipeline
        .objects
        .put_public(&key, image.bytes, &image.mime_type)
        .await?;

    let mut caption_context = vec![format!("Upload type: {}", upload_kind.as_str())];
    if let Some(custom) = &custom_prompt {
        caption_context.push(format!("Seller notes: {}", custom));
    }
    let captions = generate_captions(
        pipeline.model.as_ref(),
        &pipeline.models.caption_model,
        &source_image_url,
        &caption_context,
    )
    .await;

    let write = ContentWrite {
        fabric_id: fabric.id,
        model_image_url: Some(image_url.clone()),
        background_image_url: background_url,
        captions,
        generation_status: ResultStatus::Completed,
        error_message: None,
    };
    let content = finalize_content(repo, user_id, request.result_id, &write).await?;

    Ok(GenerateContentResponse {
        success: true,
        content_id: content.id,
        generated_image_url: image_url,
        caption_primary: write.captions.primary,
        caption_secondary: write.captions.secondary,
    })
}
