//! Sidecar probe executor.
//!
//! Issues one HTTP call from a short-lived container on the submission
//! network, so the harness itself never needs to reach the target.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::domain::errors::ProbeError;
use crate::domain::models::{ProbeOutput, ProbeRequest};
use crate::domain::ports::{ContainerEngine, RunSpec};
use crate::services::cleanup;

/// Runs auxiliary containers and returns their raw response payload.
#[derive(Clone)]
pub struct ProbeExecutor {
    engine: Arc<dyn ContainerEngine>,
    network: String,
    timeout: Duration,
}

impl ProbeExecutor {
    pub fn new(engine: Arc<dyn ContainerEngine>, network: impl Into<String>, timeout: Duration) -> Self {
        Self {
            engine,
            network: network.into(),
            timeout,
        }
    }

    pub fn engine(&self) -> &dyn ContainerEngine {
        self.engine.as_ref()
    }

    /// Run `request` and return its output bytes.
    ///
    /// The auxiliary container is removed afterwards whether or not the run
    /// succeeded.
    #[instrument(skip(self, request), fields(probe = %request.name))]
    pub async fn probe(&self, request: &ProbeRequest) -> Result<Vec<u8>, ProbeError> {
        // A crashed earlier run may still hold the name.
        cleanup::remove_container(self.engine.as_ref(), &request.name).await;

        let result = self.run(request).await;
        cleanup::remove_container(self.engine.as_ref(), &request.name).await;

        match result {
            Ok(ref payload) => debug!(bytes = payload.len(), "probe succeeded"),
            Err(ref e) => warn!(error = %e, "probe failed"),
        }
        result
    }

    async fn run(&self, request: &ProbeRequest) -> Result<Vec<u8>, ProbeError> {
        let spec = RunSpec {
            name: request.name.clone(),
            image: request.image.clone(),
            cmd: request.args.clone(),
            network: self.network.clone(),
            binds: request.binds.clone(),
        };

        let output = tokio::time::timeout(self.timeout, self.engine.run_to_completion(&spec))
            .await
            .map_err(|_| ProbeError::Timeout {
                probe: request.name.clone(),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|source| ProbeError::Engine {
                probe: request.name.clone(),
                source,
            })?;

        if !output.success() {
            return Err(ProbeError::NonZeroExit {
                probe: request.name.clone(),
                exit_code: output.exit_code,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        match request.output {
            ProbeOutput::Stdout => Ok(output.stdout),
            ProbeOutput::MountedFile(ref path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| ProbeError::OutputUnreadable {
                        probe: request.name.clone(),
                        path: path.display().to_string(),
                        source,
                    })
            }
        }
    }
}
