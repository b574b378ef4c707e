//! annotator-harness - container orchestration for annotator submissions
//!
//! Launches a submitted annotator image as an isolated network peer, drives
//! it through its HTTP API from short-lived sidecar containers, and either
//! collects annotation results or validates the service against the API
//! contract.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the container engine port
//! - **Service Layer** (`services`): resolver, probes, conformance checks, run driver
//! - **Adapters** (`adapters`): Docker (bollard), in-memory engine, log storage
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): `execute` and `validate` commands
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use annotator_harness::adapters::docker::DockerEngine;
//! use annotator_harness::services::ProbeExecutor;
//!
//! let engine = Arc::new(DockerEngine::connect()?);
//! let probes = ProbeExecutor::new(engine, "submission", Duration::from_secs(120));
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{EngineError, OrchestratorError, OrchestratorResult, ProbeError};
pub use domain::models::{
    AnnotatorKind, Config, ContainerHandle, Submission, SubmissionId, ValidationVerdict,
};
pub use domain::ports::{ContainerEngine, LogStore};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ContainerResolver, ConformanceValidator, ProbeExecutor};
