//! Final writes for generated results, including concurrent-deletion handling.

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::ContentRepository;
use crate::error::{AppError, AppResult};
use crate::models::{ContentWrite, GeneratedContent, ResultUpdate};

/// Write the terminal state of a multi-fabric result row.
///
/// When a success write fails, a failure write is attempted so the row does
/// not stay `generating`. Returns whether the requested update was stored.
pub async fn finalize_result(repo: &dyn ContentRepository, id: Uuid, update: &ResultUpdate) -> bool {
    let err = match repo.finalize_result(id, update).await {
        Ok(()) => return true,
        Err(e) => e,
    };

    error!(result_id = %id, error = %err, "Failed to finalize result");

    if let ResultUpdate::Success { .. } = update {
        let fallback = ResultUpdate::Failure {
            error: format!("Failed to save result: {}", err),
        };
        if let Err(e) = repo.finalize_result(id, &fallback).await {
            error!(result_id = %id, error = %e, "Failed to mark result as failed");
        }
    }

    false
}

/// Persist a single-job generation.
///
/// With `existing_id` the row is overwritten in place (approval back to
/// `pending`); a row that vanished meanwhile means the source was removed.
/// Without it, the fabric row is re-checked before inserting, and a foreign
/// key violation on insert is treated the same way. In both cases the error
/// carries the already-uploaded image URL.
pub async fn finalize_content(
    repo: &dyn ContentRepository,
    user_id: Uuid,
    existing_id: Option<Uuid>,
    write: &ContentWrite,
) -> AppResult<GeneratedContent> {
    let source_removed = || {
        warn!(
            %user_id,
            fabric_id = %write.fabric_id,
            image_url = write.model_image_url.as_deref().unwrap_or(""),
            "Source removed during generation, uploaded image retained unlinked"
        );
        AppError::SourceRemoved {
            generated_image_url: write.model_image_url.clone(),
        }
    };

    if let Some(id) = existing_id {
        return match repo.update_generated_content(user_id, id, write).await? {
            Some(content) => {
                info!(content_id = %content.id, status = content.generation_status.as_str(), "Content regenerated");
                Ok(content)
            }
            None => Err(source_removed()),
        };
    }

    if !repo.fabric_image_exists(write.fabric_id).await? {
        return Err(source_removed());
    }

    match repo.insert_generated_content(user_id, write).await {
        Ok(content) => {
            info!(content_id = %content.id, status = content.generation_status.as_str(), "Content created");
            Ok(content)
        }
        Err(AppError::ReferenceViolation(_)) => Err(source_removed()),
        Err(e) => Err(e),
    }
}
