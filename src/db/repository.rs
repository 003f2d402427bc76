//! Persistence seam used by the generation pipeline.
//!
//! Every read is scoped to the owning user where the table carries one.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    ContentWrite, DetectedLabels, FabricImage, GeneratedContent, GenerationResult, JobStatus,
    MultiFabricJob, NewResult, OutputMode, Reel, ReelWrite, ResultUpdate,
};

use super::DbPool;

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn find_fabric_image(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<FabricImage>>;

    /// Existence check that ignores ownership; used to detect concurrent deletion.
    async fn fabric_image_exists(&self, id: Uuid) -> AppResult<bool>;

    async fn list_background_urls(&self, user_id: Uuid) -> AppResult<Vec<String>>;

    async fn find_generated_content(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<GeneratedContent>>;

    /// Insert a content row. A foreign key violation surfaces as
    /// `AppError::ReferenceViolation`.
    async fn insert_generated_content(
        &self,
        user_id: Uuid,
        write: &ContentWrite,
    ) -> AppResult<GeneratedContent>;

    /// Overwrite a content row and reset approval to `pending`.
    /// Returns `None` when the row no longer exists.
    async fn update_generated_content(
        &self,
        user_id: Uuid,
        id: Uuid,
        write: &ContentWrite,
    ) -> AppResult<Option<GeneratedContent>>;

    async fn insert_multi_fabric_job(
        &self,
        user_id: Uuid,
        source_image_url: &str,
    ) -> AppResult<MultiFabricJob>;

    async fn find_multi_fabric_job(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<MultiFabricJob>>;

    async fn set_job_status(
        &self,
        id: Uuid,
        status: JobStatus,
        error_message: Option<String>,
    ) -> AppResult<()>;

    /// Store labels and move the job to `detected`.
    async fn save_detected_labels(&self, id: Uuid, labels: &DetectedLabels) -> AppResult<()>;

    /// Record generation inputs and move the job from `detected` to
    /// `generating` in one conditional write. Returns `false` when the job was
    /// no longer `detected`, so exactly one caller wins a concurrent claim.
    async fn start_job_generation(
        &self,
        id: Uuid,
        mannequin_image_url: Option<String>,
        background_image_url: Option<String>,
        output_mode: OutputMode,
    ) -> AppResult<bool>;

    async fn insert_result(&self, new: &NewResult) -> AppResult<GenerationResult>;

    async fn finalize_result(&self, id: Uuid, update: &ResultUpdate) -> AppResult<()>;

    /// Results of a job ordered by creation.
    async fn list_results(&self, job_id: Uuid) -> AppResult<Vec<GenerationResult>>;

    async fn find_reel(&self, user_id: Uuid, content_id: Uuid) -> AppResult<Option<Reel>>;

    async fn insert_reel(&self, user_id: Uuid, content_id: Uuid, write: &ReelWrite)
    -> AppResult<Reel>;

    async fn update_reel(&self, id: Uuid, write: &ReelWrite) -> AppResult<()>;
}

#[async_trait]
impl ContentRepository for DbPool {
    async fn find_fabric_image(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<FabricImage>> {
        self.get_fabric_image(user_id, id).await
    }

    async fn fabric_image_exists(&self, id: Uuid) -> AppResult<bool> {
        self.fabric_exists(id).await
    }

    async fn list_background_urls(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        self.get_background_urls(user_id).await
    }

    async fn find_generated_content(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<GeneratedContent>> {
        self.get_generated_content(user_id, id).await
    }

    async fn insert_generated_content(
        &self,
        user_id: Uuid,
        write: &ContentWrite,
    ) -> AppResult<GeneratedContent> {
        self.create_generated_content(user_id, write).await
    }

    async fn update_generated_content(
        &self,
        user_id: Uuid,
        id: Uuid,
        write: &ContentWrite,
    ) -> AppResult<Option<GeneratedContent>> {
        self.overwrite_generated_content(user_id, id, write).await
    }

    async fn insert_multi_fabric_job(
        &self,
        user_id: Uuid,
        source_image_url: &str,
    ) -> AppResult<MultiFabricJob> {
        self.create_multi_fabric_job(user_id, source_image_url).await
    }

    async fn find_multi_fabric_job(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<MultiFabricJob>> {
        self.get_multi_fabric_job(user_id, id).await
    }

    async fn set_job_status(
        &self,
        id: Uuid,
        status: JobStatus,
        error_message: Option<String>,
    ) -> AppResult<()> {
        self.update_job_status(id, status, error_message).await
    }

    async fn save_detected_labels(&self, id: Uuid, labels: &DetectedLabels) -> AppResult<()> {
        self.update_job_labels(id, labels).await
    }

    async fn start_job_generation(
        &self,
        id: Uuid,
        mannequin_image_url: Option<String>,
        background_image_url: Option<String>,
        output_mode: OutputMode,
    ) -> AppResult<bool> {
        self.claim_job_for_generation(id, mannequin_image_url, background_image_url, output_mode)
            .await
    }

    async fn insert_result(&self, new: &NewResult) -> AppResult<GenerationResult> {
        self.create_result(new).await
    }

    async fn finalize_result(&self, id: Uuid, update: &ResultUpdate) -> AppResult<()> {
        self.update_result(id, update).await
    }

    async fn list_results(&self, job_id: Uuid) -> AppResult<Vec<GenerationResult>> {
        self.get_results_by_job_id(job_id).await
    }

    async fn find_reel(&self, user_id: Uuid, content_id: Uuid) -> AppResult<Option<Reel>> {
        self.get_reel_by_content(user_id, content_id).await
    }

    async fn insert_reel(
        &self,
        user_id: Uuid,
        content_id: Uuid,
        write: &ReelWrite,
    ) -> AppResult<Reel> {
        self.create_reel(user_id, content_id, write).await
    }

    async fn update_reel(&self, id: Uuid, write: &ReelWrite) -> AppResult<()> {
        self.write_reel(id, write).await
    }
}
