//! Keel Core
//!
//! Core types and pipeline graph logic for the Keel deployment platform.
//!
//! This crate contains:
//! - Domain types: Core business entities (Pipeline, Job, run trees)
//! - Graph model: step graph, pipeline validation, run tree construction
//! - DTOs: Data transfer objects for inter-service communication
//!
//! Everything here is synchronous and side-effect free. Persistence lives in
//! the orchestrator.

pub mod domain;
pub mod dto;
pub mod error;
pub mod graph;
pub mod projection;
pub mod run_tree;
pub mod validate;

pub use error::{RunTreeError, ValidationError};
pub use run_tree::build_run_tree;
pub use validate::validate_pipeline;
