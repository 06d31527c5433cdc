//! Core domain types
//!
//! This module contains the core domain structures used across Keel services.
//! These types represent the fundamental business entities and are shared between
//! orchestrator (for persistence) and clients (for authoring and rendering).

pub mod job;
pub mod pipeline;
pub mod tree;
