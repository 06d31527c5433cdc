//! Job Service
//!
//! Business logic for job lifecycle transitions. Every transition of a
//! pipeline step job also refreshes the state of its run.

use keel_core::domain::job::{Job, JobState};
use keel_core::dto::job::{CompleteJob, JobOutcome};
use thiserror::Error;
use uuid::Uuid;

use super::run_service::{self, RunError};
use crate::store::{StateStore, StoreError};

/// Service error type
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    InvalidState(String),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, JobError>;

/// Get a job by ID
pub async fn get_job(store: &dyn StateStore, id: Uuid) -> Result<Job> {
    store.job_get(id).await?.ok_or(JobError::NotFound(id))
}

/// Acknowledge a queued job; it is now running
pub async fn ack_job(store: &dyn StateStore, id: Uuid) -> Result<Job> {
    let mut job = get_job(store, id).await?;

    if job.state != JobState::Queued {
        return Err(JobError::InvalidState(format!(
            "Job {} is not in Queued state (current: {:?})",
            id, job.state
        )));
    }

    job.state = JobState::Running;
    job.ack_time = Some(chrono::Utc::now());
    store.job_put(&job).await?;

    tracing::info!("Job {} acknowledged", id);

    refresh_run(store, &job).await?;
    Ok(job)
}

/// Complete a running job with its outcome
pub async fn complete_job(store: &dyn StateStore, id: Uuid, req: CompleteJob) -> Result<Job> {
    let mut job = get_job(store, id).await?;

    if job.state != JobState::Running {
        return Err(JobError::InvalidState(format!(
            "Job {} is not in Running state (current: {:?})",
            id, job.state
        )));
    }

    job.state = match req.outcome {
        JobOutcome::Success => JobState::Success,
        JobOutcome::Error => JobState::Error,
    };
    job.complete_time = Some(chrono::Utc::now());
    job.error = match req.outcome {
        JobOutcome::Success => None,
        JobOutcome::Error => req.error,
    };
    store.job_put(&job).await?;

    tracing::info!("Job {} completed with state: {:?}", id, job.state);

    refresh_run(store, &job).await?;
    Ok(job)
}

/// Cancel a job that has not finished yet
///
/// A cancelled job ends in the Error state with `cancel_time` set.
pub async fn cancel_job(store: &dyn StateStore, id: Uuid) -> Result<Job> {
    let mut job = get_job(store, id).await?;

    if job.state.is_terminal() {
        return Err(JobError::InvalidState(format!(
            "Cannot cancel job {} in terminal state {:?}",
            id, job.state
        )));
    }

    let now = chrono::Utc::now();
    job.state = JobState::Error;
    job.cancel_time = Some(now);
    job.complete_time = Some(now);
    job.error = Some("cancelled".to_string());
    store.job_put(&job).await?;

    tracing::info!("Job {} cancelled", id);

    refresh_run(store, &job).await?;
    Ok(job)
}

async fn refresh_run(store: &dyn StateStore, job: &Job) -> Result<()> {
    if let Some(op) = job.pipeline_step() {
        run_service::refresh_run_state(store, op.pipeline_id, op.run_sequence).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use keel_core::domain::job::JobOperation;
    use keel_core::domain::pipeline::{
        ExecStep, Pipeline, PipelineOwner, PipelineRunState, Step, StepKind,
    };
    use keel_core::domain::tree::RunNodeState;
    use std::collections::BTreeMap;

    fn step(name: &str, depends_on: &[&str]) -> Step {
        Step {
            name: name.to_string(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
            kind: StepKind::Exec(ExecStep {
                image: "busybox".to_string(),
                command: None,
                args: Vec::new(),
            }),
        }
    }

    /// Pipeline `root -> child`, queued once; returns (pipeline id, root job, child job)
    async fn queued_run(store: &MemoryStore) -> (Uuid, Uuid, Uuid) {
        let steps: BTreeMap<String, Step> = [step("root", &[]), step("child", &["root"])]
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect();
        let pipeline = Pipeline {
            id: Uuid::new_v4(),
            name: "release".to_string(),
            owner: Some(PipelineOwner::project("web")),
            steps,
        };
        store.pipeline_put(&pipeline).await.unwrap();

        let queued = run_service::queue_run(store, pipeline.id).await.unwrap();
        (pipeline.id, queued.jobs[0].id, queued.jobs[1].id)
    }

    fn success() -> CompleteJob {
        CompleteJob {
            outcome: JobOutcome::Success,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_ack_then_complete() {
        let store = MemoryStore::new();
        let (pipeline_id, root, _) = queued_run(&store).await;

        let acked = ack_job(&store, root).await.unwrap();
        assert_eq!(acked.state, JobState::Running);
        assert!(acked.ack_time.is_some());

        let run = store.pipeline_run_get(pipeline_id, 1).await.unwrap().unwrap();
        assert_eq!(run.state, PipelineRunState::Running);

        let done = complete_job(&store, root, success()).await.unwrap();
        assert_eq!(done.state, JobState::Success);
        assert!(done.complete_time.is_some());

        let tree = run_service::get_run_tree(&store, pipeline_id, 1)
            .await
            .unwrap()
            .tree
            .unwrap();
        assert_eq!(tree.state, RunNodeState::Success);
        assert_eq!(tree.children.nodes[0].state, RunNodeState::Queued);
    }

    #[tokio::test]
    async fn test_full_run_succeeds() {
        let store = MemoryStore::new();
        let (pipeline_id, root, child) = queued_run(&store).await;

        for id in [root, child] {
            ack_job(&store, id).await.unwrap();
            complete_job(&store, id, success()).await.unwrap();
        }

        let run = store.pipeline_run_get(pipeline_id, 1).await.unwrap().unwrap();
        assert_eq!(run.state, PipelineRunState::Success);
    }

    #[tokio::test]
    async fn test_complete_with_error_keeps_message() {
        let store = MemoryStore::new();
        let (pipeline_id, root, _) = queued_run(&store).await;

        ack_job(&store, root).await.unwrap();
        let failed = complete_job(
            &store,
            root,
            CompleteJob {
                outcome: JobOutcome::Error,
                error: Some("exit status 2".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(failed.error.as_deref(), Some("exit status 2"));
        let run = store.pipeline_run_get(pipeline_id, 1).await.unwrap().unwrap();
        assert_eq!(run.state, PipelineRunState::Error);
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let store = MemoryStore::new();
        let (_, root, _) = queued_run(&store).await;

        assert!(matches!(
            complete_job(&store, root, success()).await,
            Err(JobError::InvalidState(_))
        ));

        ack_job(&store, root).await.unwrap();
        assert!(matches!(ack_job(&store, root).await, Err(JobError::InvalidState(_))));

        complete_job(&store, root, success()).await.unwrap();
        assert!(matches!(cancel_job(&store, root).await, Err(JobError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_cancel_projects_as_cancelled() {
        let store = MemoryStore::new();
        let (pipeline_id, root, _) = queued_run(&store).await;

        let cancelled = cancel_job(&store, root).await.unwrap();
        assert_eq!(cancelled.state, JobState::Error);
        assert!(cancelled.cancel_time.is_some());
        assert_eq!(cancelled.cancel_time, cancelled.complete_time);

        let bundle = run_service::get_run_tree(&store, pipeline_id, 1).await.unwrap();
        assert_eq!(bundle.run.state, PipelineRunState::Cancelled);
        assert_eq!(bundle.tree.unwrap().state, RunNodeState::Cancelled);
    }

    #[tokio::test]
    async fn test_noop_job_has_no_run() {
        let store = MemoryStore::new();
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
        store.job_put(&job).await.unwrap();

        let acked = ack_job(&store, job.id).await.unwrap();
        assert_eq!(acked.state, JobState::Running);
    }

    #[tokio::test]
    async fn test_missing_job() {
        let store = MemoryStore::new();
        assert!(matches!(
            get_job(&store, Uuid::new_v4()).await,
            Err(JobError::NotFound(_))
        ));
    }
}
