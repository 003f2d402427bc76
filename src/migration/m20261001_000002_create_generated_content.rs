//! Migration: Create generated_content table.
//!
//! One row per single-job generation. Regeneration updates the row in place.

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
                CREATE TABLE generated_content (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting
                    user_id UUID NOT NULL,
                    fabric_id UUID NOT NULL REFERENCES fabric_images(id) ON DELETE CASCADE,

                    model_image_url TEXT,
                    background_image_url TEXT,
                    caption_english TEXT,
                    caption_hindi TEXT,

                    -- Seller approval
                    status VARCHAR(20) NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'approved', 'rejected')),

                    -- Generation outcome; image URL is set iff completed
                    generation_status VARCHAR(20) NOT NULL DEFAULT 'generating'
                        CHECK (generation_status IN ('generating', 'completed', 'failed')),
                    error_message TEXT,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                    CONSTRAINT generated_content_image_when_completed
                        CHECK ((generation_status = 'completed') = (model_image_url IS NOT NULL))
                );

                CREATE INDEX idx_generated_content_user_id ON generated_content(user_id, created_at DESC);
                CREATE INDEX idx_generated_content_fabric_id ON generated_content(fabric_id);

                CREATE TRIGGER update_generated_content_updated_at
                    BEFORE UPDATE ON generated_content
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
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
                DROP TRIGGER IF EXISTS update_generated_content_updated_at ON generated_content;
                DROP TABLE IF EXISTS generated_content CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
