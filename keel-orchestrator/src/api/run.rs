//! Run API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use keel_core::dto::pipeline::{PipelineRunBundle, QueueRunResponse};
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::run_service;
use crate::store::SharedStore;

/// POST /pipeline/{id}/run
pub async fn queue_run(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<QueueRunResponse>)> {
    tracing::info!("Queueing run for pipeline: {}", id);

    let queued = run_service::queue_run(store.as_ref(), id).await?;

    Ok((StatusCode::CREATED, Json(queued)))
}

/// GET /pipeline/{id}/run/latest/tree
pub async fn get_latest_run_tree(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PipelineRunBundle>> {
    tracing::debug!("Getting latest run tree of pipeline: {}", id);

    let bundle = run_service::get_latest_run_tree(store.as_ref(), id).await?;

    Ok(Json(bundle))
}

/// GET /pipeline/{id}/run/{sequence}/tree
pub async fn get_run_tree(
    State(store): State<SharedStore>,
    Path((id, sequence)): Path<(Uuid, u64)>,
) -> ApiResult<Json<PipelineRunBundle>> {
    tracing::debug!("Getting run {} tree of pipeline: {}", sequence, id);

    let bundle = run_service::get_run_tree(store.as_ref(), id, sequence).await?;

    Ok(Json(bundle))
}
