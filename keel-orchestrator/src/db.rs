use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::DatabaseConfig;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create pipelines table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipelines (
            id UUID PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            project VARCHAR(255),
            owner JSONB NOT NULL,
            steps JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create pipeline runs table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_runs (
            id UUID PRIMARY KEY,
            pipeline_id UUID NOT NULL REFERENCES pipelines(id) ON DELETE CASCADE,
            sequence BIGINT NOT NULL,
            state VARCHAR(50) NOT NULL,
            jobs UUID[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL,
            UNIQUE (pipeline_id, sequence)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create jobs table; pipeline columns are null for non-pipeline operations
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id UUID PRIMARY KEY,
            pipeline_id UUID,
            run_sequence BIGINT,
            operation JSONB NOT NULL,
            state VARCHAR(50) NOT NULL,
            queue_time TIMESTAMPTZ NOT NULL,
            ack_time TIMESTAMPTZ,
            complete_time TIMESTAMPTZ,
            cancel_time TIMESTAMPTZ,
            error TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better query performance
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_pipelines_project_name ON pipelines(project, name)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_run ON jobs(pipeline_id, run_sequence)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_state ON jobs(state)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
