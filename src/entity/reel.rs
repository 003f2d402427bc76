//! Reel entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_id: Uuid,
    pub voiceover_url: Option<String>,
    pub music_url: Option<String>,
    pub caption_english: Option<String>,
    pub caption_hindi: Option<String>,
    /// generating_audio, ready, failed
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::generated_content::Entity",
        from = "Column::ContentId",
        to = "super::generated_content::Column::Id",
        on_delete = "Cascade"
    )]
    Content,
}

impl Related<super::generated_content::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Content.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
