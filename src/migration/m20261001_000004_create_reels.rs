//! Migration: Create reels table.

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
                CREATE TABLE reels (
                    id UUID PRIMARY KEY,
                    user_id UUID NOT NULL,
                    content_id UUID NOT NULL REFERENCES generated_content(id) ON DELETE CASCADE,
                    voiceover_url TEXT,
                    music_url TEXT,
                    caption_english TEXT,
                    caption_hindi TEXT,
                    status VARCHAR(20) NOT NULL DEFAULT 'generating_audio'
                        CHECK (status IN ('generating_audio', 'ready', 'failed')),
                    error_message TEXT,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- One reel per content row and owner
                CREATE UNIQUE INDEX idx_reels_content_user ON reels(content_id, user_id);

                CREATE TRIGGER update_reels_updated_at
                    BEFORE UPDATE ON reels
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
                DROP TRIGGER IF EXISTS update_reels_updated_at ON reels;
                DROP TABLE IF EXISTS reels CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
