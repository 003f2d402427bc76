//! Multi-fabric job entity for SeaORM.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "multi_fabric_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub source_image_url: String,
    pub mannequin_image_url: Option<String>,
    pub background_image_url: Option<String>,
    /// separate, combined
    pub color_output_mode: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub detected_labels: Option<JsonValue>,
    /// pending, analyzing, detected, generating, completed, failed
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::multi_fabric_result::Entity")]
    Results,
}

impl Related<super::multi_fabric_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Results.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
