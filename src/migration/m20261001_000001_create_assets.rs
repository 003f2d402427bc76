//! Migration: Create upload asset tables and shared trigger function.
//!
//! Fabric, background and mannequin uploads are written by the upload flow;
//! the generation pipeline only reads them.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                -- Shared trigger function for updated_at
                CREATE OR REPLACE FUNCTION update_updated_at_column()
                RETURNS TRIGGER AS $$
                BEGIN
                    NEW.updated_at = NOW();
                    RETURN NEW;
                END;
                $$ LANGUAGE plpgsql;

                CREATE TABLE fabric_images (
                    id UUID PRIMARY KEY,
                    user_id UUID NOT NULL,
                    image_url TEXT NOT NULL,
                    file_name VARCHAR(255) NOT NULL,
                    upload_type VARCHAR(20) NOT NULL DEFAULT 'fabric'
                        CHECK (upload_type IN ('fabric', 'mannequin')),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_fabric_images_user_id ON fabric_images(user_id);

                CREATE TABLE background_images (
                    id UUID PRIMARY KEY,
                    user_id UUID NOT NULL,
                    image_url TEXT NOT NULL,
                    file_name VARCHAR(255) NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_background_images_user_id ON background_images(user_id);

                CREATE TABLE mannequin_images (
                    id UUID PRIMARY KEY,
                    user_id UUID NOT NULL,
                    image_url TEXT NOT NULL,
                    file_name VARCHAR(255) NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_mannequin_images_user_id ON mannequin_images(user_id);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TABLE IF EXISTS mannequin_images CASCADE;
                DROP TABLE IF EXISTS background_images CASCADE;
                DROP TABLE IF EXISTS fabric_images CASCADE;
                DROP FUNCTION IF EXISTS update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }
}
