//! Job state projection
//!
//! Maps a job's execution state and timestamps onto run tree node status.

use crate::domain::job::{Job, JobState};
use crate::domain::tree::RunNodeState;

/// Normalized status of a single job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub state: RunNodeState,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub complete_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// Project a job onto node status
///
/// Total over job states. Cancellation refines `Error`: an errored job with
/// a cancel time is reported as `Cancelled`.
pub fn project(job: &Job) -> Projection {
    Projection {
        state: node_state(job.state, job.cancel_time.is_some()),
        start_time: job.ack_time,
        complete_time: job.complete_time,
    }
}

pub fn node_state(state: JobState, cancel_requested: bool) -> RunNodeState {
    match state {
        JobState::Queued => RunNodeState::Queued,
        JobState::Running => RunNodeState::Running,
        JobState::Success => RunNodeState::Success,
        JobState::Error if cancel_requested => RunNodeState::Cancelled,
        JobState::Error => RunNodeState::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::JobOperation;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn test_state_table() {
        let cases = [
            (JobState::Queued, false, RunNodeState::Queued),
            (JobState::Queued, true, RunNodeState::Queued),
            (JobState::Running, false, RunNodeState::Running),
            (JobState::Running, true, RunNodeState::Running),
            (JobState::Success, false, RunNodeState::Success),
            (JobState::Success, true, RunNodeState::Success),
            (JobState::Error, false, RunNodeState::Error),
            (JobState::Error, true, RunNodeState::Cancelled),
        ];

        for (state, cancelled, expected) in cases {
            assert_eq!(
                node_state(state, cancelled),
                expected,
                "{:?} cancel={}",
                state,
                cancelled
            );
        }
    }

    #[test]
    fn test_times_copied_from_job() {
        let ack = Utc.with_ymd_and_hms(2023, 1, 1, 13, 0, 0).unwrap();
        let cancel = Utc.with_ymd_and_hms(2023, 1, 1, 13, 8, 0).unwrap();
        let done = Utc.with_ymd_and_hms(2023, 1, 1, 13, 10, 0).unwrap();

        let job = Job {
            id: Uuid::new_v4(),
            operation: JobOperation::Noop,
            state: JobState::Error,
            queue_time: ack,
            ack_time: Some(ack),
            complete_time: Some(done),
            cancel_time: Some(cancel),
            error: Some("cancelled".to_string()),
        };

        assert_eq!(
            project(&job),
            Projection {
                state: RunNodeState::Cancelled,
                start_time: Some(ack),
                complete_time: Some(done),
            }
        );
    }
}
