//! Database queries for multi-fabric jobs and their results.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::multi_fabric_job::{self as job, Entity as Job};
use crate::entity::multi_fabric_result::{self as result, Entity as JobResult};
use crate::error::{AppError, AppResult};
use crate::models::{
    DetectedLabels, GenerationResult, JobStatus, MultiFabricJob, NewResult, OutputMode,
    ResultStatus, ResultUpdate,
};

use super::DbPool;

impl DbPool {
    /// Insert a new job in `pending`.
    pub async fn create_multi_fabric_job(
        &self,
        user_id: Uuid,
        source_image_url: &str,
    ) -> AppResult<MultiFabricJob> {
        let now = Utc::now();

        let model = job::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            source_image_url: Set(source_image_url.to_string()),
            mannequin_image_url: Set(None),
            background_image_url: Set(None),
            color_output_mode: Set(OutputMode::default().as_str().to_string()),
            detected_labels: Set(None),
            status: Set(JobStatus::Pending.as_str().to_string()),
            error_message: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert job: {}", e)))?;

        Ok(model_to_job(inserted))
    }

    /// Get a job owned by `user_id`.
    pub async fn get_multi_fabric_job(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<MultiFabricJob>> {
        let found = Job::find_by_id(id)
            .filter(job::Column::UserId.eq(user_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get job: {}", e)))?;

        Ok(found.map(model_to_job))
    }

    async fn get_job_model(&self, id: Uuid) -> AppResult<job::Model> {
        Job::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get job: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Job {}", id)))
    }

    /// Update job status.
    pub async fn update_job_status(
        &self,
        id: Uuid,
        status: JobStatus,
        error_message: Option<String>,
    ) -> AppResult<()> {
        let mut active: job::ActiveModel = self.get_job_model(id).await?.into();
        active.status = Set(status.as_str().to_string());
        active.error_message = Set(error_message);
        active.updated_at = Set(Utc::now());

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update job status: {}", e)))?;

        Ok(())
    }

    /// Store detected labels and mark the job `detected`.
    pub async fn update_job_labels(&self, id: Uuid, labels: &DetectedLabels) -> AppResult<()> {
        let json = serde_json::to_value(labels)
            .map_err(|e| AppError::Database(format!("Failed to encode labels: {}", e)))?;

        let mut active: job::ActiveModel = self.get_job_model(id).await?.into();
        active.detected_labels = Set(Some(json));
        active.status = Set(JobStatus::Detected.as_str().to_string());
        active.error_message = Set(None);
        active.updated_at = Set(Utc::now());

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to store labels: {}", e)))?;

        Ok(())
    }

    /// Store generation inputs and move the job `detected -> generating`.
    ///
    /// The status filter makes this a compare-and-set: of two concurrent
    /// claims only one updates a row. Returns whether this call won.
    pub async fn claim_job_for_generation(
        &self,
        id: Uuid,
        mannequin_image_url: Option<String>,
        background_image_url: Option<String>,
        output_mode: OutputMode,
    ) -> AppResult<bool> {
        let result = Job::update_many()
            .col_expr(job::Column::MannequinImageUrl, Expr::value(mannequin_image_url))
            .col_expr(job::Column::BackgroundImageUrl, Expr::value(background_image_url))
            .col_expr(
                job::Column::ColorOutputMode,
                Expr::value(output_mode.as_str().to_string()),
            )
            .col_expr(
                job::Column::Status,
                Expr::value(JobStatus::Generating.as_str().to_string()),
            )
            .col_expr(job::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(job::Column::Id.eq(id))
            .filter(job::Column::Status.eq(JobStatus::Detected.as_str()))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to start job generation: {}", e)))?;

        Ok(result.rows_affected == 1)
    }

    /// Insert a result row in `generating`.
    pub async fn create_result(&self, new: &NewResult) -> AppResult<GenerationResult> {
        let model = result::ActiveModel {
            id: Set(Uuid::now_v7()),
            job_id: Set(new.job_id),
            user_id: Set(new.user_id),
            label: Set(new.label.clone()),
            color_variant: Set(new.color_variant.clone()),
            generated_image_url: Set(None),
            caption_english: Set(None),
            caption_hindi: Set(None),
            status: Set(ResultStatus::Generating.as_str().to_string()),
            error_message: Set(None),
            created_at: Set(Utc::now()),
        };

        let inserted = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert result: {}", e)))?;

        Ok(model_to_result(inserted))
    }

    /// Write the terminal state of a result row.
    pub async fn update_result(&self, id: Uuid, update: &ResultUpdate) -> AppResult<()> {
        let existing = JobResult::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get result: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Result {}", id)))?;

        let mut active: result::ActiveModel = existing.into();
        active.status = Set(update.status().as_str().to_string());
        match update {
            ResultUpdate::Success {
                image_url,
                captions,
            } => {
                active.generated_image_url = Set(Some(image_url.clone()));
                active.caption_english = Set(Some(captions.primary.clone()));
                active.caption_hindi = Set(Some(captions.secondary.clone()));
                active.error_message = Set(None);
            }
            ResultUpdate::Failure { error } => {
                active.generated_image_url = Set(None);
                active.error_message = Set(Some(error.clone()));
            }
        }

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to finalize result: {}", e)))?;

        Ok(())
    }

    /// Results of a job in creation order.
    pub async fn get_results_by_job_id(&self, job_id: Uuid) -> AppResult<Vec<GenerationResult>> {
        let rows = JobResult::find()
            .filter(result::Column::JobId.eq(job_id))
            .order_by_asc(result::Column::CreatedAt)
            .order_by_asc(result::Column::Id) // UUIDv7 is time-ordered
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list results: {}", e)))?;

        Ok(rows.into_iter().map(model_to_result).collect())
    }
}

fn model_to_job(m: job::Model) -> MultiFabricJob {
    MultiFabricJob {
        id: m.id,
        user_id: m.user_id,
        source_image_url: m.source_image_url,
        mannequin_image_url: m.mannequin_image_url,
        background_image_url: m.background_image_url,
        output_mode: OutputMode::parse(&m.color_output_mode).unwrap_or_default(),
        detected_labels: m
            .detected_labels
            .as_ref()
            .map(|v| DetectedLabels::from_value(v).normalized()),
        status: JobStatus::parse(&m.status).unwrap_or(JobStatus::Failed),
        error_message: m.error_message,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn model_to_result(m: result::Model) -> GenerationResult {
    GenerationResult {
        id: m.id,
        job_id: m.job_id,
        user_id: m.user_id,
        label: m.label,
        color_variant: m.color_variant,
        generated_image_url: m.generated_image_url,
        caption_english: m.caption_english,
        caption_hindi: m.caption_hindi,
        status: ResultStatus::parse(&m.status).unwrap_or(ResultStatus::Failed),
        error_message: m.error_message,
        created_at: m.created_at,
    }
}
