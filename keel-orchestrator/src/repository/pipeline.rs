//! Pipeline Repository
//!
//! Handles all database operations related to pipelines.

use keel_core::domain::pipeline::{Pipeline, PipelineOwner};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{Result, StoreError};

/// Insert a pipeline, or replace the one with the same ID
pub async fn upsert(pool: &PgPool, pipeline: &Pipeline) -> Result<()> {
    let now = chrono::Utc::now();

    sqlx::query(
        r#"
        INSERT INTO pipelines (id, name, project, owner, steps, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name, project = EXCLUDED.project, owner = EXCLUDED.owner,
            steps = EXCLUDED.steps, updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(pipeline.id)
    .bind(&pipeline.name)
    .bind(pipeline.project())
    .bind(serde_json::to_value(&pipeline.owner)?)
    .bind(serde_json::to_value(&pipeline.steps)?)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Find a pipeline by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Pipeline>> {
    let row = sqlx::query_as::<_, PipelineRow>(
        r#"
        SELECT id, name, owner, steps
        FROM pipelines
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Pipeline::try_from).transpose()
}

/// Find a pipeline by name within a project
pub async fn find_by_name(pool: &PgPool, project: &str, name: &str) -> Result<Option<Pipeline>> {
    let row = sqlx::query_as::<_, PipelineRow>(
        r#"
        SELECT id, name, owner, steps
        FROM pipelines
        WHERE project = $1 AND name = $2
        "#,
    )
    .bind(project)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    row.map(Pipeline::try_from).transpose()
}

/// List pipelines, optionally filtered by project
pub async fn list(pool: &PgPool, project: Option<&str>) -> Result<Vec<Pipeline>> {
    let rows = sqlx::query_as::<_, PipelineRow>(
        r#"
        SELECT id, name, owner, steps
        FROM pipelines
        WHERE $1::TEXT IS NULL OR project = $1
        ORDER BY name ASC, id ASC
        "#,
    )
    .bind(project)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Pipeline::try_from).collect()
}

/// Delete a pipeline by ID; runs and jobs go with it
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM jobs WHERE pipeline_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM pipelines WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct PipelineRow {
    id: Uuid,
    name: String,
    owner: serde_json::Value,
    steps: serde_json::Value,
}

impl TryFrom<PipelineRow> for Pipeline {
    type Error = StoreError;

    fn try_from(row: PipelineRow) -> std::result::Result<Self, Self::Error> {
        let owner: Option<PipelineOwner> = serde_json::from_value(row.owner)?;

        Ok(Pipeline {
            id: row.id,
            name: row.name,
            owner,
            steps: serde_json::from_value(row.steps)?,
        })
    }
}
