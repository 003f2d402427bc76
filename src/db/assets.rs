//! Database queries for upload assets.

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::entity::background_image::{self, Entity as BackgroundImage};
use crate::entity::fabric_image::{self, Entity as FabricImageEntity};
use crate::error::{AppError, AppResult};
use crate::models::{FabricImage, UploadKind};

use super::DbPool;

impl DbPool {
    /// Get a fabric upload owned by `user_id`.
    pub async fn get_fabric_image(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<FabricImage>> {
        let result = FabricImageEntity::find_by_id(id)
            .filter(fabric_image::Column::UserId.eq(user_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get fabric image: {}", e)))?;

        Ok(result.map(model_to_fabric_image))
    }

    /// Whether the fabric row still exists, regardless of owner.
    pub async fn fabric_exists(&self, id: Uuid) -> AppResult<bool> {
        let count = FabricImageEntity::find_by_id(id)
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to check fabric image: {}", e)))?;

        Ok(count > 0)
    }

    /// URLs of every background the user uploaded, newest first.
    pub async fn get_background_urls(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        let urls = BackgroundImage::find()
            .select_only()
            .column(background_image::Column::ImageUrl)
            .filter(background_image::Column::UserId.eq(user_id))
            .order_by_desc(background_image::Column::CreatedAt)
            .into_tuple::<String>()
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list backgrounds: {}", e)))?;

        Ok(urls)
    }
}

fn model_to_fabric_image(m: fabric_image::Model) -> FabricImage {
    FabricImage {
        id: m.id,
        user_id: m.user_id,
        image_url: m.image_url,
        file_name: m.file_name,
        upload_type: UploadKind::parse(&m.upload_type).unwrap_or(UploadKind::Fabric),
    }
}
