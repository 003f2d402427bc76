//! Database queries for single-job generated content.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr};
use uuid::Uuid;

use crate::entity::generated_content::{self as content, ActiveModel, Entity as Content};
use crate::error::{AppError, AppResult};
use crate::models::{ApprovalStatus, ContentWrite, GeneratedContent, ResultStatus};

use super::DbPool;

impl DbPool {
    /// Get a content row owned by `user_id`.
    pub async fn get_generated_content(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<GeneratedContent>> {
        let result = Content::find_by_id(id)
            .filter(content::Column::UserId.eq(user_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get content: {}", e)))?;

        Ok(result.map(model_to_content))
    }

    /// Insert a new content row with approval `pending`.
    pub async fn create_generated_content(
        &self,
        user_id: Uuid,
        write: &ContentWrite,
    ) -> AppResult<GeneratedContent> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            fabric_id: Set(write.fabric_id),
            model_image_url: Set(write.model_image_url.clone()),
            background_image_url: Set(write.background_image_url.clone()),
            caption_english: Set(Some(write.captions.primary.clone())),
            caption_hindi: Set(Some(write.captions.secondary.clone())),
            status: Set(ApprovalStatus::Pending.as_str().to_string()),
            generation_status: Set(write.generation_status.as_str().to_string()),
            error_message: Set(write.error_message.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(self.connection()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_))) {
                AppError::ReferenceViolation(format!("fabric {}", write.fabric_id))
            } else {
                AppError::Database(format!("Failed to insert content: {}", e))
            }
        })?;

        Ok(model_to_content(result))
    }

    /// Overwrite image, captions and generation outcome in place and reset
    /// approval to `pending`. `None` when the row is gone.
    pub async fn overwrite_generated_content(
        &self,
        user_id: Uuid,
        id: Uuid,
        write: &ContentWrite,
    ) -> AppResult<Option<GeneratedContent>> {
        let Some(existing) = Content::find_by_id(id)
            .filter(content::Column::UserId.eq(user_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get content: {}", e)))?
        else {
            return Ok(None);
        };

        let mut active: ActiveModel = existing.into();
        active.model_image_url = Set(write.model_image_url.clone());
        active.background_image_url = Set(write.background_image_url.clone());
        active.caption_english = Set(Some(write.captions.primary.clone()));
        active.caption_hindi = Set(Some(write.captions.secondary.clone()));
        active.status = Set(ApprovalStatus::Pending.as_str().to_string());
        active.generation_status = Set(write.generation_status.as_str().to_string());
        active.error_message = Set(write.error_message.clone());
        active.updated_at = Set(Utc::now());

        match active.update(self.connection()).await {
            Ok(model) => Ok(Some(model_to_content(model))),
            // Deleted between the read and the write
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(AppError::Database(format!(
                "Failed to update content: {}",
                e
            ))),
        }
    }
}

fn model_to_content(m: content::Model) -> GeneratedContent {
    GeneratedContent {
        id: m.id,
        user_id: m.user_id,
        fabric_id: m.fabric_id,
        model_image_url: m.model_image_url,
        background_image_url: m.background_image_url,
        caption_english: m.caption_english,
        caption_hindi: m.caption_hindi,
        status: ApprovalStatus::parse(&m.status).unwrap_or(ApprovalStatus::Pending),
        generation_status: ResultStatus::parse(&m.generation_status)
            .unwrap_or(ResultStatus::Failed),
        error_message: m.error_message,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}
