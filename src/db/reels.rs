//! Database queries for reels.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::reel::{self, ActiveModel, Entity as ReelEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Reel, ReelStatus, ReelWrite};

use super::DbPool;

impl DbPool {
    /// Reel of a content row, if one was created before.
    pub async fn get_reel_by_content(
        &self,
        user_id: Uuid,
        content_id: Uuid,
    ) -> AppResult<Option<Reel>> {
        let found = ReelEntity::find()
            .filter(reel::Column::ContentId.eq(content_id))
            .filter(reel::Column::UserId.eq(user_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get reel: {}", e)))?;

        Ok(found.map(model_to_reel))
    }

    pub async fn create_reel(
        &self,
        user_id: Uuid,
        content_id: Uuid,
        write: &ReelWrite,
    ) -> AppResult<Reel> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            content_id: Set(content_id),
            voiceover_url: Set(write.voiceover_url.clone()),
            music_url: Set(write.music_url.clone()),
            caption_english: Set(write.caption_english.clone()),
            caption_hindi: Set(write.caption_hindi.clone()),
            status: Set(write.status.as_str().to_string()),
            error_message: Set(write.error_message.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert reel: {}", e)))?;

        Ok(model_to_reel(inserted))
    }

    pub async fn write_reel(&self, id: Uuid, write: &ReelWrite) -> AppResult<()> {
        let existing = ReelEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get reel: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Reel {}", id)))?;

        let mut active: ActiveModel = existing.into();
        active.voiceover_url = Set(write.voiceover_url.clone());
        active.music_url = Set(write.music_url.clone());
        active.caption_english = Set(write.caption_english.clone());
        active.caption_hindi = Set(write.caption_hindi.clone());
        active.status = Set(write.status.as_str().to_string());
        active.error_message = Set(write.error_message.clone());
        active.updated_at = Set(Utc::now());

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update reel: {}", e)))?;

        Ok(())
    }
}

fn model_to_reel(m: reel::Model) -> Reel {
    Reel {
        id: m.id,
        user_id: m.user_id,
        content_id: m.content_id,
        voiceover_url: m.voiceover_url,
        music_url: m.music_url,
        caption_english: m.caption_english,
        caption_hindi: m.caption_hindi,
        status: ReelStatus::parse(&m.status).unwrap_or(ReelStatus::Failed),
        error_message: m.error_message,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}
