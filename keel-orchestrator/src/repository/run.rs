//! Pipeline Run Repository
//!
//! Handles all database operations related to pipeline runs.

use keel_core::domain::pipeline::{PipelineRun, PipelineRunState};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{Result, StoreError};

/// Insert a run only if its sequence is still free
///
/// Returns false when another run already holds the sequence.
pub async fn insert_new(pool: &PgPool, run: &PipelineRun) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO pipeline_runs (id, pipeline_id, sequence, state, jobs, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (pipeline_id, sequence) DO NOTHING
        "#,
    )
    .bind(run.id)
    .bind(run.pipeline_id)
    .bind(run.sequence as i64)
    .bind(state_to_string(run.state))
    .bind(&run.jobs)
    .bind(run.created_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Insert a run, or replace the one with the same pipeline and sequence
pub async fn upsert(pool: &PgPool, run: &PipelineRun) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO pipeline_runs (id, pipeline_id, sequence, state, jobs, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (pipeline_id, sequence) DO UPDATE
        SET state = EXCLUDED.state, jobs = EXCLUDED.jobs
        "#,
    )
    .bind(run.id)
    .bind(run.pipeline_id)
    .bind(run.sequence as i64)
    .bind(state_to_string(run.state))
    .bind(&run.jobs)
    .bind(run.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Runs of a pipeline, oldest first
pub async fn find_by_pipeline(pool: &PgPool, pipeline_id: Uuid) -> Result<Vec<PipelineRun>> {
    let rows = sqlx::query_as::<_, RunRow>(
        r#"
        SELECT id, pipeline_id, sequence, state, jobs, created_at
        FROM pipeline_runs
        WHERE pipeline_id = $1
        ORDER BY sequence ASC
        "#,
    )
    .bind(pipeline_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(PipelineRun::try_from).collect()
}

/// Find a run by pipeline and sequence
pub async fn find_by_sequence(
    pool: &PgPool,
    pipeline_id: Uuid,
    sequence: u64,
) -> Result<Option<PipelineRun>> {
    let row = sqlx::query_as::<_, RunRow>(
        r#"
        SELECT id, pipeline_id, sequence, state, jobs, created_at
        FROM pipeline_runs
        WHERE pipeline_id = $1 AND sequence = $2
        "#,
    )
    .bind(pipeline_id)
    .bind(sequence as i64)
    .fetch_optional(pool)
    .await?;

    row.map(PipelineRun::try_from).transpose()
}

/// Find the run with the highest sequence
pub async fn find_latest(pool: &PgPool, pipeline_id: Uuid) -> Result<Option<PipelineRun>> {
    let row = sqlx::query_as::<_, RunRow>(
        r#"
        SELECT id, pipeline_id, sequence, state, jobs, created_at
        FROM pipeline_runs
        WHERE pipeline_id = $1
        ORDER BY sequence DESC
        LIMIT 1
        "#,
    )
    .bind(pipeline_id)
    .fetch_optional(pool)
    .await?;

    row.map(PipelineRun::try_from).transpose()
}

// =============================================================================
// Helper Functions
// =============================================================================

fn state_to_string(state: PipelineRunState) -> &'static str {
    match state {
        PipelineRunState::Pending => "Pending",
        PipelineRunState::Running => "Running",
        PipelineRunState::Success => "Success",
        PipelineRunState::Error => "Error",
        PipelineRunState::Cancelled => "Cancelled",
    }
}

fn string_to_state(s: &str) -> Result<PipelineRunState> {
    match s {
        "Pending" => Ok(PipelineRunState::Pending),
        "Running" => Ok(PipelineRunState::Running),
        "Success" => Ok(PipelineRunState::Success),
        "Error" => Ok(PipelineRunState::Error),
        "Cancelled" => Ok(PipelineRunState::Cancelled),
        other => Err(StoreError::UnknownState(other.to_string())),
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct RunRow {
    id: Uuid,
    pipeline_id: Uuid,
    sequence: i64,
    state: String,
    jobs: Vec<Uuid>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<RunRow> for PipelineRun {
    type Error = StoreError;

    fn try_from(row: RunRow) -> std::result::Result<Self, Self::Error> {
        Ok(PipelineRun {
            id: row.id,
            pipeline_id: row.pipeline_id,
            sequence: row.sequence as u64,
            state: string_to_state(&row.state)?,
            jobs: row.jobs,
            created_at: row.created_at,
        })
    }
}
