//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod job;
pub mod pipeline;
pub mod run;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::store::SharedStore;

/// Create the main API router with all endpoints
pub fn create_router(store: SharedStore) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Pipeline endpoints
        .route("/pipeline/validate", post(pipeline::validate_pipeline))
        .route("/pipeline/create", post(pipeline::create_pipeline))
        .route("/pipeline/list", get(pipeline::list_pipelines))
        .route(
            "/pipeline/{id}",
            get(pipeline::get_pipeline)
                .put(pipeline::update_pipeline)
                .delete(pipeline::delete_pipeline),
        )
        // Run endpoints
        .route("/pipeline/{id}/run", post(run::queue_run))
        .route(
            "/pipeline/{id}/run/latest/tree",
            get(run::get_latest_run_tree),
        )
        .route("/pipeline/{id}/run/{sequence}/tree", get(run::get_run_tree))
        // Job endpoints
        .route("/job/{id}", get(job::get_job))
        .route("/job/{id}/ack", post(job::ack_job))
        .route("/job/{id}/complete", post(job::complete_job))
        .route("/job/{id}/cancel", post(job::cancel_job))
        // Add state and middleware
        .with_state(store)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
