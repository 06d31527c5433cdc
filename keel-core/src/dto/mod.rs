//! Data Transfer Objects for inter-service communication
//!
//! This module contains DTOs used for communication between the Keel
//! orchestrator and its clients. DTOs are lightweight request and response
//! shapes built around the domain entities.

pub mod job;
pub mod pipeline;
