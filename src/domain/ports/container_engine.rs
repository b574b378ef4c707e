//! Container engine port - the capability every lifecycle component is handed.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::errors::EngineResult;
use crate::domain::models::ContainerState;

/// Entry from a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    /// Name without the engine's leading `/`.
    pub name: String,
    pub state: ContainerState,
}

/// Live attributes of a single container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDetails {
    pub id: String,
    pub name: String,
    pub state: ContainerState,
    pub image: Option<String>,
    /// Network name to the IP address assigned on it.
    pub networks: HashMap<String, Option<String>>,
}

/// Parameters for a detached, long-running container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub name: String,
    pub image: String,
    pub network: String,
    pub binds: Vec<String>,
    pub memory_limit_bytes: i64,
}

/// Parameters for a container that is run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub name: String,
    pub image: String,
    pub cmd: Vec<String>,
    pub network: String,
    pub binds: Vec<String>,
}

/// Exit status and captured output of a finished container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub exit_code: i64,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl RunOutput {
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Operations the harness needs from a container engine.
///
/// Implementations must treat names as exact identifiers; no operation does
/// prefix or substring matching.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// List every container, running or stopped.
    async fn list_containers(&self) -> EngineResult<Vec<ContainerSummary>>;

    /// Create and start a detached container, pulling the image if needed.
    async fn launch(&self, spec: &LaunchSpec) -> EngineResult<ContainerSummary>;

    /// Inspect a container by name or id.
    async fn inspect(&self, name: &str) -> EngineResult<ContainerDetails>;

    /// Create, start and wait for a container, returning its output.
    ///
    /// The finished container is left in place; callers remove it.
    async fn run_to_completion(&self, spec: &RunSpec) -> EngineResult<RunOutput>;

    async fn stop_container(&self, name: &str) -> EngineResult<()>;

    async fn remove_container(&self, name: &str, force: bool) -> EngineResult<()>;

    async fn remove_image(&self, reference: &str, force: bool) -> EngineResult<()>;

    /// Combined stdout and stderr of a container so far.
    async fn logs(&self, name: &str) -> EngineResult<Vec<u8>>;
}
