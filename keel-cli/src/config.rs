//! CLI configuration

use keel_client::OrchestratorClient;

#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the orchestrator service
    pub orchestrator_url: String,
}

impl Config {
    pub fn client(&self) -> OrchestratorClient {
        OrchestratorClient::new(&self.orchestrator_url)
    }
}
