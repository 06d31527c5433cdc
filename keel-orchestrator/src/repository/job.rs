//! Job Repository
//!
//! Handles all database operations related to jobs.

use keel_core::domain::job::{Job, JobOperation, JobState};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{Result, StoreError};

/// Insert a job, or replace the one with the same ID
pub async fn upsert(pool: &PgPool, job: &Job) -> Result<()> {
    let (pipeline_id, run_sequence) = match job.pipeline_step() {
        Some(op) => (Some(op.pipeline_id), Some(op.run_sequence as i64)),
        None => (None, None),
    };

    sqlx::query(
        r#"
        INSERT INTO jobs (
            id, pipeline_id, run_sequence, operation, state,
            queue_time, ack_time, complete_time, cancel_time, error
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO UPDATE
        SET pipeline_id = EXCLUDED.pipeline_id, run_sequence = EXCLUDED.run_sequence,
            operation = EXCLUDED.operation,
            state = EXCLUDED.state, ack_time = EXCLUDED.ack_time,
            complete_time = EXCLUDED.complete_time, cancel_time = EXCLUDED.cancel_time,
            error = EXCLUDED.error
        "#,
    )
    .bind(job.id)
    .bind(pipeline_id)
    .bind(run_sequence)
    .bind(serde_json::to_value(&job.operation)?)
    .bind(state_to_string(job.state))
    .bind(job.queue_time)
    .bind(job.ack_time)
    .bind(job.complete_time)
    .bind(job.cancel_time)
    .bind(&job.error)
    .execute(pool)
    .await?;

    Ok(())
}

/// Find a job by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Job>> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT id, operation, state, queue_time, ack_time, complete_time, cancel_time, error
        FROM jobs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Job::try_from).transpose()
}

/// Find the jobs listed by one pipeline run
pub async fn find_by_run(pool: &PgPool, pipeline_id: Uuid, sequence: u64) -> Result<Vec<Job>> {
    let rows = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT j.id, j.operation, j.state, j.queue_time, j.ack_time,
               j.complete_time, j.cancel_time, j.error
        FROM pipeline_runs r
        JOIN jobs j ON j.id = ANY(r.jobs)
        WHERE r.pipeline_id = $1 AND r.sequence = $2
        ORDER BY j.queue_time ASC
        "#,
    )
    .bind(pipeline_id)
    .bind(sequence as i64)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Job::try_from).collect()
}

// =============================================================================
// Helper Functions
// =============================================================================

fn state_to_string(state: JobState) -> &'static str {
    match state {
        JobState::Queued => "Queued",
        JobState::Running => "Running",
        JobState::Success => "Success",
        JobState::Error => "Error",
    }
}

fn string_to_state(s: &str) -> Result<JobState> {
    match s {
        "Queued" => Ok(JobState::Queued),
        "Running" => Ok(JobState::Running),
        "Success" => Ok(JobState::Success),
        "Error" => Ok(JobState::Error),
        other => Err(StoreError::UnknownState(other.to_string())),
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    operation: serde_json::Value,
    state: String,
    queue_time: chrono::DateTime<chrono::Utc>,
    ack_time: Option<chrono::DateTime<chrono::Utc>>,
    complete_time: Option<chrono::DateTime<chrono::Utc>>,
    cancel_time: Option<chrono::DateTime<chrono::Utc>>,
    error: Option<String>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> std::result::Result<Self, Self::Error> {
        let operation: JobOperation = serde_json::from_value(row.operation)?;

        Ok(Job {
            id: row.id,
            operation,
            state: string_to_state(&row.state)?,
            queue_time: row.queue_time,
            ack_time: row.ack_time,
            complete_time: row.complete_time,
            cancel_time: row.cancel_time,
            error: row.error,
        })
    }
}
