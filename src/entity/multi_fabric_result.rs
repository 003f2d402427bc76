//! Multi-fabric result entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "multi_fabric_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub color_variant: Option<String>,
    pub generated_image_url: Option<String>,
    pub caption_english: Option<String>,
    pub caption_hindi: Option<String>,
    /// generating, completed, failed
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::multi_fabric_job::Entity",
        from = "Column::JobId",
        to = "super::multi_fabric_job::Column::Id",
        on_delete = "Cascade"
    )]
    Job,
}

impl Related<super::multi_fabric_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
