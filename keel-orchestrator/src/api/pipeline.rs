//! Pipeline API Handlers
//!
//! HTTP endpoints for pipeline management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use keel_core::domain::pipeline::Pipeline;
use keel_core::dto::pipeline::{CreatePipeline, ListPipelines, PipelineBundle};
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::pipeline_service;
use crate::store::SharedStore;

/// POST /pipeline/validate
/// Check a pipeline definition without storing it
pub async fn validate_pipeline(Json(req): Json<CreatePipeline>) -> ApiResult<StatusCode> {
    tracing::debug!("Validating pipeline: {}", req.name);

    pipeline_service::validate(&req)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /pipeline/create
pub async fn create_pipeline(
    State(store): State<SharedStore>,
    Json(req): Json<CreatePipeline>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    tracing::info!("Creating pipeline: {}", req.name);

    let pipeline = pipeline_service::create_pipeline(store.as_ref(), req).await?;

    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// GET /pipeline/list?project=
pub async fn list_pipelines(
    State(store): State<SharedStore>,
    Query(query): Query<ListPipelines>,
) -> ApiResult<Json<Vec<PipelineBundle>>> {
    tracing::debug!("Listing pipelines (project: {:?})", query.project);

    let bundles =
        pipeline_service::list_pipelines(store.as_ref(), query.project.as_deref()).await?;

    Ok(Json(bundles))
}

/// GET /pipeline/{id}
pub async fn get_pipeline(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Pipeline>> {
    tracing::debug!("Getting pipeline: {}", id);

    let pipeline = pipeline_service::get_pipeline(store.as_ref(), id).await?;

    Ok(Json(pipeline))
}

/// PUT /pipeline/{id}
pub async fn update_pipeline(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreatePipeline>,
) -> ApiResult<Json<Pipeline>> {
    tracing::info!("Updating pipeline: {}", id);

    let pipeline = pipeline_service::update_pipeline(store.as_ref(), id, req).await?;

    Ok(Json(pipeline))
}

/// DELETE /pipeline/{id}
pub async fn delete_pipeline(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting pipeline: {}", id);

    pipeline_service::delete_pipeline(store.as_ref(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
