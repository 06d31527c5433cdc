//! Job API Handlers
//!
//! HTTP endpoints for job lifecycle management.

use axum::{
    Json,
    extract::{Path, State},
};
use keel_core::domain::job::Job;
use keel_core::dto::job::CompleteJob;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::job_service;
use crate::store::SharedStore;

/// GET /job/{id}
pub async fn get_job(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Job>> {
    tracing::debug!("Getting job: {}", id);

    let job = job_service::get_job(store.as_ref(), id).await?;

    Ok(Json(job))
}

/// POST /job/{id}/ack
/// Mark a queued job as picked up
pub async fn ack_job(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Job>> {
    tracing::info!("Acknowledging job: {}", id);

    let job = job_service::ack_job(store.as_ref(), id).await?;

    Ok(Json(job))
}

/// POST /job/{id}/complete
pub async fn complete_job(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    Json(req): Json<CompleteJob>,
) -> ApiResult<Json<Job>> {
    tracing::info!("Completing job {} with outcome: {:?}", id, req.outcome);

    let job = job_service::complete_job(store.as_ref(), id, req).await?;

    Ok(Json(job))
}

/// POST /job/{id}/cancel
pub async fn cancel_job(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Job>> {
    tracing::info!("Cancelling job: {}", id);

    let job = job_service::cancel_job(store.as_ref(), id).await?;

    Ok(Json(job))
}
