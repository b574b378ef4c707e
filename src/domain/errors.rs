//! Domain errors for the annotator harness.

use thiserror::Error;

/// Errors surfaced by a container engine implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("No such resource: {0}")]
    NotFound(String),

    #[error("Resource conflict: {0}")]
    Conflict(String),

    #[error("Container engine error: {0}")]
    Api(String),
}

impl EngineError {
    /// Whether the engine reported the resource as already gone.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Failure of a single sidecar probe.
///
/// Recovered into a reason string by the conformance checks; fatal in the
/// annotation run driver.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe {probe} exited with status {exit_code}: {stderr}")]
    NonZeroExit {
        probe: String,
        exit_code: i64,
        stderr: String,
    },

    #[error("probe {probe} timed out after {seconds}s")]
    Timeout { probe: String, seconds: u64 },

    #[error("probe {probe} could not be run: {source}")]
    Engine {
        probe: String,
        #[source]
        source: EngineError,
    },

    #[error("probe {probe} did not produce {path}: {source}")]
    OutputUnreadable {
        probe: String,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Orchestrator-level errors. Everything except `ProbeExecution` inside a
/// conformance check terminates the run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Failed to launch container {name} from {image}: {reason}")]
    ContainerLaunch {
        name: String,
        image: String,
        reason: String,
    },

    #[error("No container found for submission {0}")]
    ContainerNotFound(String),

    #[error("Container {container} is not attached to network '{network}'")]
    NetworkNotAttached { container: String, network: String },

    #[error("Service in container {container} did not become ready within {waited_secs}s")]
    ServiceNotReady { container: String, waited_secs: u64 },

    #[error("Probe execution failed: {0}")]
    ProbeExecution(#[from] ProbeError),

    #[error("Expected output file {0} is missing after the run")]
    OutputMissing(String),

    #[error("Invalid input record: {0}")]
    InvalidRecord(String),

    #[error("Annotator returned a malformed response for note {note}: {reason}")]
    MalformedResponse { note: String, reason: String },

    #[error("Container engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

impl From<bollard::errors::Error> for EngineError {
    fn from(err: bollard::errors::Error) -> Self {
        match err {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => Self::NotFound(message),
            bollard::errors::Error::DockerResponseServerError {
                status_code: 409,
                message,
            } => Self::Conflict(message),
            other => Self::Api(other.to_string()),
        }
    }
}
