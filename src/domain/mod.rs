//! Domain layer for the annotator harness
//!
//! This module contains the core models, errors and ports.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{EngineError, OrchestratorError, OrchestratorResult, ProbeError};
