//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_assets;
mod m20261001_000002_create_generated_content;
mod m20261001_000003_create_multi_fabric;
mod m20261001_000004_create_reels;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_assets::Migration),
            Box::new(m20261001_000002_create_generated_content::Migration),
            Box::new(m20261001_000003_create_multi_fabric::Migration),
            Box::new(m20261001_000004_create_reels::Migration),
        ]
    }
}
