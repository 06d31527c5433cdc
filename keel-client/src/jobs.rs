//! Job-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use keel_core::domain::job::Job;
use keel_core::dto::job::CompleteJob;
use uuid::Uuid;

impl OrchestratorClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Get a job by ID
    pub async fn get_job(&self, job_id: Uuid) -> Result<Job> {
        let response = self
            .client
            .get(self.url(&format!("/job/{}", job_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Acknowledge a queued job
    pub async fn ack_job(&self, job_id: Uuid) -> Result<Job> {
        let response = self
            .client
            .post(self.url(&format!("/job/{}/ack", job_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Report the outcome of a running job
    ///
    /// # Example
    /// ```no_run
    /// # use keel_client::OrchestratorClient;
    /// # use keel_core::dto::job::{CompleteJob, JobOutcome};
    /// # use uuid::Uuid;
    /// # async fn example(job_id: Uuid) -> anyhow::Result<()> {
    /// let client = OrchestratorClient::new("http://localhost:8080");
    /// client.complete_job(job_id, &CompleteJob {
    ///     outcome: JobOutcome::Error,
    ///     error: Some("exit status 1".to_string()),
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn complete_job(&self, job_id: Uuid, req: &CompleteJob) -> Result<Job> {
        let response = self
            .client
            .post(self.url(&format!("/job/{}/complete", job_id)))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Cancel a job that has not finished
    pub async fn cancel_job(&self, job_id: Uuid) -> Result<Job> {
        let response = self
            .client
            .post(self.url(&format!("/job/{}/cancel", job_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }
}
