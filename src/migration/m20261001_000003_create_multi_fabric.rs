//! Migration: Create multi_fabric_jobs and multi_fabric_results tables.

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
                CREATE TABLE multi_fabric_jobs (
                    id UUID PRIMARY KEY,
                    user_id UUID NOT NULL,
                    source_image_url TEXT NOT NULL,
                    mannequin_image_url TEXT,
                    background_image_url TEXT,
                    color_output_mode VARCHAR(20) NOT NULL DEFAULT 'separate'
                        CHECK (color_output_mode IN ('separate', 'combined')),

                    -- {pieces, sample_count, has_bottom, color_variants, summary}
                    detected_labels JSONB,

                    status VARCHAR(20) NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'analyzing', 'detected', 'generating', 'completed', 'failed')),
                    error_message TEXT,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_multi_fabric_jobs_user_id ON multi_fabric_jobs(user_id, created_at DESC);

                CREATE TRIGGER update_multi_fabric_jobs_updated_at
                    BEFORE UPDATE ON multi_fabric_jobs
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();

                CREATE TABLE multi_fabric_results (
                    id UUID PRIMARY KEY, -- UUIDv7 so creation order is stable
                    job_id UUID NOT NULL REFERENCES multi_fabric_jobs(id) ON DELETE CASCADE,
                    user_id UUID NOT NULL,
                    label VARCHAR(100) NOT NULL,
                    color_variant TEXT,
                    generated_image_url TEXT,
                    caption_english TEXT,
                    caption_hindi TEXT,
                    status VARCHAR(20) NOT NULL DEFAULT 'generating'
                        CHECK (status IN ('generating', 'completed', 'failed')),
                    error_message TEXT,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_multi_fabric_results_job_id ON multi_fabric_results(job_id, created_at);
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
                DROP TABLE IF EXISTS multi_fabric_results CASCADE;
                DROP TRIGGER IF EXISTS update_multi_fabric_jobs_updated_at ON multi_fabric_jobs;
                DROP TABLE IF EXISTS multi_fabric_jobs CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
