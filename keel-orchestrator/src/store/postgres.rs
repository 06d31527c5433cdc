//! PostgreSQL state store

use async_trait::async_trait;
use keel_core::domain::job::Job;
use keel_core::domain::pipeline::{Pipeline, PipelineRun};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Result, StateStore};
use crate::repository::{job_repository, pipeline_repository, run_repository};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StateStore for PgStore {
    async fn pipeline_put(&self, pipeline: &Pipeline) -> Result<()> {
        pipeline_repository::upsert(&self.pool, pipeline).await
    }

    async fn pipeline_get(&self, id: Uuid) -> Result<Option<Pipeline>> {
        pipeline_repository::find_by_id(&self.pool, id).await
    }

    async fn pipeline_get_by_name(&self, project: &str, name: &str) -> Result<Option<Pipeline>> {
        pipeline_repository::find_by_name(&self.pool, project, name).await
    }

    async fn pipeline_list(&self, project: Option<&str>) -> Result<Vec<Pipeline>> {
        pipeline_repository::list(&self.pool, project).await
    }

    async fn pipeline_delete(&self, id: Uuid) -> Result<bool> {
        pipeline_repository::delete(&self.pool, id).await
    }

    async fn pipeline_run_create(&self, run: &PipelineRun) -> Result<bool> {
        run_repository::insert_new(&self.pool, run).await
    }

    async fn pipeline_run_put(&self, run: &PipelineRun) -> Result<()> {
        run_repository::upsert(&self.pool, run).await
    }

    async fn pipeline_run_list(&self, pipeline_id: Uuid) -> Result<Vec<PipelineRun>> {
        run_repository::find_by_pipeline(&self.pool, pipeline_id).await
    }

    async fn pipeline_run_get(
        &self,
        pipeline_id: Uuid,
        sequence: u64,
    ) -> Result<Option<PipelineRun>> {
        run_repository::find_by_sequence(&self.pool, pipeline_id, sequence).await
    }

    async fn pipeline_run_get_latest(&self, pipeline_id: Uuid) -> Result<Option<PipelineRun>> {
        run_repository::find_latest(&self.pool, pipeline_id).await
    }

    async fn job_put(&self, job: &Job) -> Result<()> {
        job_repository::upsert(&self.pool, job).await
    }

    async fn job_get(&self, id: Uuid) -> Result<Option<Job>> {
        job_repository::find_by_id(&self.pool, id).await
    }

    async fn jobs_for_run(&self, pipeline_id: Uuid, sequence: u64) -> Result<Vec<Job>> {
        job_repository::find_by_run(&self.pool, pipeline_id, sequence).await
    }
}
