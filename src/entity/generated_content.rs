//! Single-job generated content entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "generated_content")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub fabric_id: Uuid,
    pub model_image_url: Option<String>,
    pub background_image_url: Option<String>,
    pub caption_english: Option<String>,
    pub caption_hindi: Option<String>,
    /// Approval: pending, approved, rejected
    pub status: String,
    /// generating, completed, failed
    pub generation_status: String,
    pub error_message: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fabric_image::Entity",
        from = "Column::FabricId",
        to = "super::fabric_image::Column::Id",
        on_delete = "Cascade"
    )]
    Fabric,
    #[sea_orm(has_many = "super::reel::Entity")]
    Reels,
}

impl Related<super::fabric_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fabric.def()
    }
}

impl Related<super::reel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reels.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
