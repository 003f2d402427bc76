//! Fabric upload entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fabric_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub file_name: String,
    /// fabric, mannequin
    pub upload_type: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::generated_content::Entity")]
    GeneratedContent,
}

impl Related<super::generated_content::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GeneratedContent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
