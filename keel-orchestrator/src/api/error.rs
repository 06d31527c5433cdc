//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use keel_core::ValidationError;

use crate::service::job_service::JobError;
use crate::service::pipeline_service::PipelineError;
use crate::service::run_service::RunError;
use crate::store::StoreError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Invalid(ValidationError),
    Conflict(String),
    Unprocessable(String),
    StoreError(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::Invalid(err) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": err.to_string(), "field": err.field() }),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, serde_json::json!({ "error": msg })),
            ApiError::Unprocessable(msg) => {
                tracing::warn!("Unprocessable: {}", msg);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    serde_json::json!({ "error": msg }),
                )
            }
            ApiError::StoreError(err) => {
                tracing::error!("Store error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::StoreError(err)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotFound(id) => ApiError::NotFound(format!("Pipeline {} not found", id)),
            PipelineError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            PipelineError::Validation(err) => ApiError::Invalid(err),
            err @ PipelineError::Duplicate { .. } => ApiError::Conflict(err.to_string()),
            PipelineError::Store(err) => ApiError::StoreError(err),
        }
    }
}

impl From<RunError> for ApiError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::PipelineNotFound(id) => {
                ApiError::NotFound(format!("Pipeline {} not found", id))
            }
            err @ (RunError::RunNotFound { .. } | RunError::NoRuns(_)) => {
                ApiError::NotFound(err.to_string())
            }
            RunError::InvalidPipeline(err) => ApiError::Invalid(err),
            err @ RunError::Tree(_) => ApiError::Unprocessable(err.to_string()),
            err @ RunError::SequenceContention(_) => ApiError::Conflict(err.to_string()),
            RunError::Store(err) => ApiError::StoreError(err),
        }
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(id) => ApiError::NotFound(format!("Job {} not found", id)),
            JobError::InvalidState(msg) => ApiError::BadRequest(msg),
            JobError::Run(err) => err.into(),
            JobError::Store(err) => ApiError::StoreError(err),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
