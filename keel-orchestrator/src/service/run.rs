//! Run Service
//!
//! Queues pipeline runs and serves their run trees.

use keel_core::domain::job::{Job, JobOperation, JobState, PipelineStepOp};
use keel_core::domain::pipeline::{PipelineRun, PipelineRunState};
use keel_core::dto::pipeline::{PipelineRunBundle, QueueRunResponse};
use keel_core::graph::StepGraph;
use keel_core::validate::validate_pipeline;
use keel_core::{RunTreeError, ValidationError, build_run_tree};
use thiserror::Error;
use uuid::Uuid;

use crate::store::{StateStore, StoreError};

/// Service error type
#[derive(Debug, Error)]
pub enum RunError {
    #[error("pipeline {0} not found")]
    PipelineNotFound(Uuid),

    #[error("pipeline {pipeline_id} has no run {sequence}")]
    RunNotFound { pipeline_id: Uuid, sequence: u64 },

    #[error("pipeline {0} has not run yet")]
    NoRuns(Uuid),

    #[error("stored pipeline is invalid: {0}")]
    InvalidPipeline(#[from] ValidationError),

    #[error("run tree unavailable: {0}")]
    Tree(#[from] RunTreeError),

    #[error("could not allocate a run sequence for pipeline {0}, try again")]
    SequenceContention(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, RunError>;

/// Attempts at claiming the next sequence before giving up
const MAX_SEQUENCE_ATTEMPTS: usize = 8;

/// Queue a new run of a pipeline
///
/// Creates one queued job per step. Nothing is dispatched here; the jobs
/// wait for a worker to ack them.
pub async fn queue_run(store: &dyn StateStore, pipeline_id: Uuid) -> Result<QueueRunResponse> {
    let pipeline = store
        .pipeline_get(pipeline_id)
        .await?
        .ok_or(RunError::PipelineNotFound(pipeline_id))?;

    validate_pipeline(&pipeline)?;

    let graph = StepGraph::from_steps(&pipeline.steps);
    let Some(order) = graph.topological_order() else {
        let path = graph.find_cycle().unwrap_or_default();
        return Err(ValidationError::Cycle { path }.into());
    };

    // Job and run IDs stay fixed across attempts, so a retry overwrites the
    // jobs written by the previous one instead of leaving them behind.
    let job_ids: Vec<Uuid> = order.iter().map(|_| Uuid::new_v4()).collect();
    let run_id = Uuid::new_v4();

    for attempt in 1..=MAX_SEQUENCE_ATTEMPTS {
        let sequence = store
            .pipeline_run_get_latest(pipeline_id)
            .await?
            .map(|run| run.sequence + 1)
            .unwrap_or(1);

        let now = chrono::Utc::now();
        let jobs: Vec<Job> = order
            .iter()
            .zip(&job_ids)
            .map(|(step, &id)| Job {
                id,
                operation: JobOperation::PipelineStep(PipelineStepOp {
                    pipeline_id,
                    run_sequence: sequence,
                    step: (*step).clone(),
                }),
                state: JobState::Queued,
                queue_time: now,
                ack_time: None,
                complete_time: None,
                cancel_time: None,
                error: None,
            })
            .collect();

        for job in &jobs {
            store.job_put(job).await?;
        }

        let run = PipelineRun {
            id: run_id,
            pipeline_id,
            sequence,
            state: PipelineRunState::Pending,
            jobs: job_ids.clone(),
            created_at: now,
        };
        if !store.pipeline_run_create(&run).await? {
            tracing::debug!(
                "Run {} of pipeline {} already taken (attempt {})",
                sequence,
                pipeline.name,
                attempt
            );
            continue;
        }

        tracing::info!(
            "Queued run {} of pipeline {} ({} job(s))",
            sequence,
            pipeline.name,
            jobs.len()
        );

        // Topological order starts with the root
        let root_job = jobs.first().map(|job| job.id).unwrap_or_default();

        return Ok(QueueRunResponse {
            run,
            root_job,
            jobs,
        });
    }

    tracing::warn!(
        "Gave up queueing pipeline {} after {} attempts",
        pipeline.name,
        MAX_SEQUENCE_ATTEMPTS
    );
    Err(RunError::SequenceContention(pipeline_id))
}

/// Get a run together with its tree
pub async fn get_run_tree(
    store: &dyn StateStore,
    pipeline_id: Uuid,
    sequence: u64,
) -> Result<PipelineRunBundle> {
    ensure_pipeline(store, pipeline_id).await?;

    let run = store
        .pipeline_run_get(pipeline_id, sequence)
        .await?
        .ok_or(RunError::RunNotFound {
            pipeline_id,
            sequence,
        })?;

    bundle_with_tree(store, run).await
}

/// Get the most recent run together with its tree
pub async fn get_latest_run_tree(
    store: &dyn StateStore,
    pipeline_id: Uuid,
) -> Result<PipelineRunBundle> {
    ensure_pipeline(store, pipeline_id).await?;

    let run = store
        .pipeline_run_get_latest(pipeline_id)
        .await?
        .ok_or(RunError::NoRuns(pipeline_id))?;

    bundle_with_tree(store, run).await
}

/// Recompute a run's state after one of its jobs changed
pub async fn refresh_run_state(
    store: &dyn StateStore,
    pipeline_id: Uuid,
    sequence: u64,
) -> Result<()> {
    let Some(mut run) = store.pipeline_run_get(pipeline_id, sequence).await? else {
        tracing::warn!("Run {} of pipeline {} vanished", sequence, pipeline_id);
        return Ok(());
    };

    let jobs = store.jobs_for_run(pipeline_id, sequence).await?;
    let state = aggregate_state(&jobs);

    if run.state != state {
        tracing::info!(
            "Run {} of pipeline {}: {:?} -> {:?}",
            sequence,
            pipeline_id,
            run.state,
            state
        );
        run.state = state;
        store.pipeline_run_put(&run).await?;
    }

    Ok(())
}

/// Overall run state from the states of its jobs
pub fn aggregate_state(jobs: &[Job]) -> PipelineRunState {
    let failed = || jobs.iter().filter(|j| j.state == JobState::Error);

    if failed().any(|j| j.cancel_time.is_some()) {
        return PipelineRunState::Cancelled;
    }
    if failed().next().is_some() {
        return PipelineRunState::Error;
    }
    if !jobs.is_empty() && jobs.iter().all(|j| j.state == JobState::Success) {
        return PipelineRunState::Success;
    }
    if jobs
        .iter()
        .any(|j| matches!(j.state, JobState::Running | JobState::Success))
    {
        return PipelineRunState::Running;
    }

    PipelineRunState::Pending
}

// =============================================================================
// Helper Functions
// =============================================================================

async fn ensure_pipeline(store: &dyn StateStore, pipeline_id: Uuid) -> Result<()> {
    match store.pipeline_get(pipeline_id).await? {
        Some(_) => Ok(()),
        None => Err(RunError::PipelineNotFound(pipeline_id)),
    }
}

async fn bundle_with_tree(store: &dyn StateStore, run: PipelineRun) -> Result<PipelineRunBundle> {
    let jobs = store.jobs_for_run(run.pipeline_id, run.sequence).await?;
    let tree = build_run_tree(&jobs).inspect_err(|err| {
        tracing::warn!(
            "Run {} of pipeline {} has an inconsistent tree: {}",
            run.sequence,
            run.pipeline_id,
            err
        );
    })?;

    Ok(PipelineRunBundle {
        run,
        tree: Some(tree),
    })
}
