//! Ports (interfaces) for external systems.

pub mod container_engine;
pub mod log_store;

pub use container_engine::{
    ContainerDetails, ContainerEngine, ContainerSummary, LaunchSpec, RunOutput, RunSpec,
};
pub use log_store::LogStore;
