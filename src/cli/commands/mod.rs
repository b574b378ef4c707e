//! CLI command implementations.

pub mod execute;
pub mod validate;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::docker::DockerEngine;
use crate::domain::models::{Config, SubmissionId};
use crate::domain::ports::ContainerEngine;
use crate::services::{ContainerResolver, LaunchSettings, ProbeExecutor, ReadinessPolicy};

/// Engine, probe executor and resolver shared by both commands.
pub struct Harness {
    pub engine: Arc<dyn ContainerEngine>,
    pub probes: ProbeExecutor,
    pub resolver: ContainerResolver,
    pub workdir: PathBuf,
}

impl Harness {
    /// Connect to the local Docker daemon.
    pub fn connect(config: &Config, workdir: &Path) -> Result<Self> {
        let engine: Arc<dyn ContainerEngine> =
            Arc::new(DockerEngine::connect().context("Failed to connect to Docker")?);
        Self::with_engine(engine, config, workdir)
    }

    /// Build the harness around an existing engine. The work dir is created
    /// if needed and made absolute, since bind mounts require host paths.
    pub fn with_engine(
        engine: Arc<dyn ContainerEngine>,
        config: &Config,
        workdir: &Path,
    ) -> Result<Self> {
        std::fs::create_dir_all(workdir)
            .with_context(|| format!("Failed to create work dir {}", workdir.display()))?;
        let workdir = workdir
            .canonicalize()
            .with_context(|| format!("Failed to resolve work dir {}", workdir.display()))?;

        let probes = ProbeExecutor::new(
            engine.clone(),
            config.engine.network.as_str(),
            Duration::from_secs(config.probes.timeout_secs),
        );
        let binds = vec![format!(
            "{}:{}:rw",
            workdir.display(),
            config.engine.output_mount
        )];
        let settings =
            LaunchSettings::from_config(&config.engine, &config.probes.http_client_image, binds)
                .with_context(|| {
                    format!("memory_limit_mb {} is out of range", config.engine.memory_limit_mb)
                })?;
        let resolver = ContainerResolver::new(
            engine.clone(),
            settings,
            ReadinessPolicy::from(&config.readiness),
            probes.clone(),
        );

        Ok(Self {
            engine,
            probes,
            resolver,
            workdir,
        })
    }
}

/// Parse a submission id argument.
pub fn parse_submission_id(raw: &str) -> Result<SubmissionId> {
    SubmissionId::new(raw).map_err(|e| anyhow::anyhow!(e))
}

/// The credentials file is handed to the log store integration; it must exist.
pub fn check_credentials(path: &Path) -> Result<()> {
    anyhow::ensure!(
        path.is_file(),
        "Credentials file {} does not exist",
        path.display()
    );
    Ok(())
}
