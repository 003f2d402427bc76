//! Shared handles for the generation services.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use super::ai_gateway::GenerativeModel;
use super::audio::AudioSynthesizer;
use super::resolver::BackgroundPicker;
use super::storage::ObjectStore;
use crate::config::AiSettings;
use crate::db::ContentRepository;
use crate::error::{AppError, AppResult};
use crate::models::JobStatus;

/// Gateway model names per task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub image_model: String,
    pub caption_model: String,
    pub vision_model: String,
}

impl From<&AiSettings> for ModelSettings {
    fn from(settings: &AiSettings) -> Self {
        Self {
            image_model: settings.image_model.clone(),
            caption_model: settings.caption_model.clone(),
            vision_model: settings.vision_model.clone(),
        }
    }
}

/// Collaborators used by every pipeline operation. Shared as `web::Data`.
#[derive(Clone)]
pub struct Pipeline {
    pub repo: Arc<dyn ContentRepository>,
    pub model: Arc<dyn GenerativeModel>,
    pub audio: Arc<dyn AudioSynthesizer>,
    pub objects: Arc<dyn ObjectStore>,
    pub picker: Arc<dyn BackgroundPicker>,
    pub models: ModelSettings,
    /// Upper bound on samples per multi-fabric job
    pub max_samples: usize,
}

/// Move a job from `from` to `to`, persisting the new status.
///
/// Transitions outside the job state table are logged and rejected.
pub async fn advance_job(
    repo: &dyn ContentRepository,
    job_id: Uuid,
    from: JobStatus,
    to: JobStatus,
    error_message: Option<String>,
) -> AppResult<JobStatus> {
    let next = from.transition(to).map_err(|e| {
        warn!(%job_id, error = %e, "Rejected job transition");
        AppError::InvalidInput(format!("Job is {}, cannot move to {}", from, to))
    })?;

    repo.set_job_status(job_id, next, error_message).await?;
    Ok(next)
}

/// Best-effort move to `failed` after an error; a failed write is only logged.
pub async fn fail_job(repo: &dyn ContentRepository, job_id: Uuid, from: JobStatus, message: &str) {
    if let Err(e) = advance_job(
        repo,
        job_id,
        from,
        JobStatus::Failed,
        Some(message.to_string()),
    )
    .await
    {
        warn!(%job_id, error = %e, "Failed to mark job as failed");
    }
}
