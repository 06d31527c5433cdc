//! Run-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use keel_core::dto::pipeline::{PipelineRunBundle, QueueRunResponse};
use uuid::Uuid;

impl OrchestratorClient {
    /// Queue a new run of a pipeline
    pub async fn queue_run(&self, pipeline_id: Uuid) -> Result<QueueRunResponse> {
        let response = self
            .client
            .post(self.url(&format!("/pipeline/{}/run", pipeline_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get one run with its tree
    pub async fn get_run_tree(&self, pipeline_id: Uuid, sequence: u64) -> Result<PipelineRunBundle> {
        let response = self
            .client
            .get(self.url(&format!("/pipeline/{}/run/{}/tree", pipeline_id, sequence)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the most recent run with its tree
    ///
    /// Fails with a 404 `ApiError` when the pipeline has never run.
    pub async fn get_latest_run_tree(&self, pipeline_id: Uuid) -> Result<PipelineRunBundle> {
        let response = self
            .client
            .get(self.url(&format!("/pipeline/{}/run/latest/tree", pipeline_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }
}
