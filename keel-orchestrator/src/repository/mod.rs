//! Repository Module
//!
//! PostgreSQL data access layer backing [`crate::store::PgStore`].
//! Each repository handles database operations for a specific domain entity.

pub mod job;
pub mod pipeline;
pub mod run;

// Re-export for convenience
pub use job as job_repository;
pub use pipeline as pipeline_repository;
pub use run as run_repository;
