//! Pipeline-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use keel_core::domain::pipeline::Pipeline;
use keel_core::dto::pipeline::{CreatePipeline, PipelineBundle};
use uuid::Uuid;

impl OrchestratorClient {
    // =============================================================================
    // Pipeline Management
    // =============================================================================

    /// Check a pipeline definition on the server without storing it
    pub async fn validate_pipeline(&self, req: &CreatePipeline) -> Result<()> {
        let response = self
            .client
            .post(self.url("/pipeline/validate"))
            .json(req)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Create a new pipeline
    ///
    /// # Example
    /// ```no_run
    /// # use keel_client::OrchestratorClient;
    /// # use keel_core::domain::pipeline::PipelineOwner;
    /// # use keel_core::dto::pipeline::CreatePipeline;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = OrchestratorClient::new("http://localhost:8080");
    /// let pipeline = client.create_pipeline(&CreatePipeline {
    ///     name: "deploy".to_string(),
    ///     owner: Some(PipelineOwner::project("web")),
    ///     steps: Default::default(),
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_pipeline(&self, req: &CreatePipeline) -> Result<Pipeline> {
        let response = self
            .client
            .post(self.url("/pipeline/create"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List pipelines with their run statistics
    ///
    /// # Arguments
    /// * `project` - Restrict the listing to one project
    pub async fn list_pipelines(&self, project: Option<&str>) -> Result<Vec<PipelineBundle>> {
        let mut request = self.client.get(self.url("/pipeline/list"));
        if let Some(project) = project {
            request = request.query(&[("project", project)]);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Get a pipeline by ID
    pub async fn get_pipeline(&self, pipeline_id: Uuid) -> Result<Pipeline> {
        let response = self
            .client
            .get(self.url(&format!("/pipeline/{}", pipeline_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Replace a pipeline definition, keeping its ID
    pub async fn update_pipeline(&self, pipeline_id: Uuid, req: &CreatePipeline) -> Result<Pipeline> {
        let response = self
            .client
            .put(self.url(&format!("/pipeline/{}", pipeline_id)))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a pipeline with all of its runs
    pub async fn delete_pipeline(&self, pipeline_id: Uuid) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/pipeline/{}", pipeline_id)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
