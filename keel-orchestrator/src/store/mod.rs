//! State Store
//!
//! Persistence contract for pipelines, pipeline runs and jobs.
//! Optional lookups return `Option` so that a missing entity (for example a
//! pipeline that has never run) is an empty result rather than an error.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use keel_core::domain::job::Job;
use keel_core::domain::pipeline::{Pipeline, PipelineRun};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Store error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt stored record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt stored record: unknown state {0:?}")]
    UnknownState(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Shared handle used as axum state
pub type SharedStore = Arc<dyn StateStore>;

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Insert or replace a pipeline
    async fn pipeline_put(&self, pipeline: &Pipeline) -> Result<()>;

    async fn pipeline_get(&self, id: Uuid) -> Result<Option<Pipeline>>;

    /// Find a pipeline by name within a project
    async fn pipeline_get_by_name(&self, project: &str, name: &str) -> Result<Option<Pipeline>>;

    /// List pipelines, optionally restricted to one project
    async fn pipeline_list(&self, project: Option<&str>) -> Result<Vec<Pipeline>>;

    /// Delete a pipeline with its runs and jobs; false if it did not exist
    async fn pipeline_delete(&self, id: Uuid) -> Result<bool>;

    /// Insert a new pipeline run unless its sequence is already taken
    ///
    /// Returns false, leaving the store untouched, when the pipeline already
    /// has a run with the same sequence.
    async fn pipeline_run_create(&self, run: &PipelineRun) -> Result<bool>;

    /// Insert or replace a pipeline run, keyed by pipeline and sequence
    async fn pipeline_run_put(&self, run: &PipelineRun) -> Result<()>;

    /// Runs of a pipeline, ordered by ascending sequence
    async fn pipeline_run_list(&self, pipeline_id: Uuid) -> Result<Vec<PipelineRun>>;

    async fn pipeline_run_get(&self, pipeline_id: Uuid, sequence: u64)
    -> Result<Option<PipelineRun>>;

    async fn pipeline_run_get_latest(&self, pipeline_id: Uuid) -> Result<Option<PipelineRun>>;

    /// Insert or replace a job
    async fn job_put(&self, job: &Job) -> Result<()>;

    async fn job_get(&self, id: Uuid) -> Result<Option<Job>>;

    /// Jobs belonging to one run, in no particular order
    async fn jobs_for_run(&self, pipeline_id: Uuid, sequence: u64) -> Result<Vec<Job>>;
}
