//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pipeline::Step;

/// Job execution record
///
/// Created when a pipeline run schedules a step and mutated by the
/// ack/complete/cancel transitions. Read-only for run tree construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub operation: JobOperation,
    pub state: JobState,
    pub queue_time: chrono::DateTime<chrono::Utc>,
    pub ack_time: Option<chrono::DateTime<chrono::Utc>>,
    pub complete_time: Option<chrono::DateTime<chrono::Utc>>,
    pub cancel_time: Option<chrono::DateTime<chrono::Utc>>,
    pub error: Option<String>,
}

impl Job {
    /// The pipeline step operation, if this job runs one
    pub fn pipeline_step(&self) -> Option<&PipelineStepOp> {
        match &self.operation {
            JobOperation::PipelineStep(op) => Some(op),
            _ => None,
        }
    }
}

/// Job execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Running,
    Success,
    Error,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Success | JobState::Error)
    }
}

/// Work a job performs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobOperation {
    PipelineStep(PipelineStepOp),
    Noop,
}

/// Execute one step of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStepOp {
    pub pipeline_id: Uuid,
    pub run_sequence: u64,
    pub step: Step,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Success.is_terminal());
        assert!(JobState::Error.is_terminal());
    }

    #[test]
    fn test_noop_has_no_pipeline_step() {
        let job = Job {
            id: Uuid::new_v4(),
            operation: JobOperation::Noop,
            state: JobState::Queued,
            queue_time: chrono::Utc::now(),
            ack_time: None,
            complete_time: None,
            cancel_time: None,
            error: None,
        };
        assert!(job.pipeline_step().is_none());
    }
}
