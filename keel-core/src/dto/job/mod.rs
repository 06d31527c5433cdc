//! Job DTOs for inter-service communication

use serde::{Deserialize, Serialize};

/// Final outcome reported when a job completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobOutcome {
    Success,
    Error,
}

/// Request to complete a running job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteJob {
    pub outcome: JobOutcome,
    #[serde(default)]
    pub error: Option<String>,
}
