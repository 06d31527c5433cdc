//! Pipeline Service
//!
//! Business logic for pipeline management. Every create or update goes
//! through graph validation before it reaches the store.

use keel_core::ValidationError;
use keel_core::domain::pipeline::Pipeline;
use keel_core::dto::pipeline::{CreatePipeline, PipelineBundle, PipelineRunBundle};
use keel_core::validate::validate_pipeline;
use thiserror::Error;
use uuid::Uuid;

use crate::store::{StateStore, StoreError};

/// Service error type
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("invalid pipeline: {0}")]
    Validation(#[from] ValidationError),

    #[error("pipeline {name:?} already exists in project {project:?}")]
    Duplicate { project: String, name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Check a pipeline definition without persisting it
pub fn validate(req: &CreatePipeline) -> Result<()> {
    validate_pipeline_request(req)?;
    validate_pipeline(&req.clone().into_pipeline(Uuid::nil()))?;
    Ok(())
}

/// Create a new pipeline
pub async fn create_pipeline(store: &dyn StateStore, req: CreatePipeline) -> Result<Pipeline> {
    validate_pipeline_request(&req)?;

    let pipeline = req.into_pipeline(Uuid::new_v4());
    validate_pipeline(&pipeline)?;
    ensure_unique_name(store, &pipeline).await?;

    store.pipeline_put(&pipeline).await?;

    tracing::info!(
        "Pipeline created: {} ({}) with {} step(s)",
        pipeline.name,
        pipeline.id,
        pipeline.steps.len()
    );

    Ok(pipeline)
}

/// Get a pipeline by ID
pub async fn get_pipeline(store: &dyn StateStore, id: Uuid) -> Result<Pipeline> {
    store
        .pipeline_get(id)
        .await?
        .ok_or(PipelineError::NotFound(id))
}

/// List pipelines with their run count and latest run
///
/// Pagination is not supported; every matching pipeline is returned.
pub async fn list_pipelines(
    store: &dyn StateStore,
    project: Option<&str>,
) -> Result<Vec<PipelineBundle>> {
    let pipelines = store.pipeline_list(project).await?;
    let mut bundles = Vec::with_capacity(pipelines.len());

    for pipeline in pipelines {
        let runs = store.pipeline_run_list(pipeline.id).await?;
        let last_run = store
            .pipeline_run_get_latest(pipeline.id)
            .await?
            .map(|run| PipelineRunBundle { run, tree: None });

        bundles.push(PipelineBundle {
            pipeline,
            total_runs: runs.len() as u64,
            last_run,
        });
    }

    Ok(bundles)
}

/// Replace a pipeline definition
pub async fn update_pipeline(
    store: &dyn StateStore,
    id: Uuid,
    req: CreatePipeline,
) -> Result<Pipeline> {
    validate_pipeline_request(&req)?;

    // Check if pipeline exists
    let _existing = get_pipeline(store, id).await?;

    let pipeline = req.into_pipeline(id);
    validate_pipeline(&pipeline)?;
    ensure_unique_name(store, &pipeline).await?;

    store.pipeline_put(&pipeline).await?;

    tracing::info!("Pipeline updated: {} ({})", pipeline.name, pipeline.id);

    Ok(pipeline)
}

/// Delete a pipeline
pub async fn delete_pipeline(store: &dyn StateStore, id: Uuid) -> Result<()> {
    let deleted = store.pipeline_delete(id).await?;

    if !deleted {
        return Err(PipelineError::NotFound(id));
    }

    tracing::info!("Pipeline deleted: {}", id);

    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_pipeline_request(req: &CreatePipeline) -> Result<()> {
    if req.name.trim().is_empty() {
        return Err(PipelineError::InvalidRequest(
            "name: cannot be blank".to_string(),
        ));
    }

    if req.name.len() > 255 {
        return Err(PipelineError::InvalidRequest(
            "name: too long (max 255 characters)".to_string(),
        ));
    }

    Ok(())
}

/// Names are unique within the owning project
async fn ensure_unique_name(store: &dyn StateStore, pipeline: &Pipeline) -> Result<()> {
    let Some(project) = pipeline.project() else {
        return Ok(());
    };

    match store.pipeline_get_by_name(project, &pipeline.name).await? {
        Some(existing) if existing.id != pipeline.id => Err(PipelineError::Duplicate {
            project: project.to_string(),
            name: pipeline.name.clone(),
        }),
        _ => Ok(()),
    }
}
