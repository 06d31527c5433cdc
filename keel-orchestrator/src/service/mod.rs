//! Service Module
//!
//! Business logic layer for the orchestrator.
//! Services work against a `StateStore` and contain domain logic.

pub mod job;
pub mod pipeline;
pub mod run;

// Re-export for convenience
pub use job as job_service;
pub use pipeline as pipeline_service;
pub use run as run_service;
