//! Docker implementation of the container engine port.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions, LogOutput,
    LogsOptions, RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
    WaitContainerOptions,
};
use bollard::image::{CreateImageOptions, RemoveImageOptions};
use bollard::models::HostConfig;
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::ContainerState;
use crate::domain::ports::{
    ContainerDetails, ContainerEngine, ContainerSummary, LaunchSpec, RunOutput, RunSpec,
};

/// Grace period before a stop escalates to a kill.
const STOP_TIMEOUT_SECS: i64 = 10;

/// Container engine backed by the local Docker daemon.
#[derive(Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect using the local defaults (unix socket or `DOCKER_HOST`).
    pub fn connect() -> EngineResult<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }

    pub const fn from_client(docker: Docker) -> Self {
        Self { docker }
    }

    /// Pull `image` unless it is already present locally.
    async fn ensure_image(&self, image: &str) -> EngineResult<()> {
        if self.docker.inspect_image(image).await.is_ok() {
            return Ok(());
        }

        info!(image, "pulling image");
        let options = Some(CreateImageOptions {
            from_image: image,
            ..Default::default()
        });
        let mut stream = self.docker.create_image(options, None, None);
        while let Some(progress) = stream.next().await {
            progress?;
        }
        Ok(())
    }

    async fn create_and_start(
        &self,
        name: &str,
        config: Config<String>,
    ) -> EngineResult<String> {
        let options = CreateContainerOptions {
            name: name.to_string(),
            platform: None,
        };
        let response = self.docker.create_container(Some(options), config).await?;
        if let Err(e) = self
            .docker
            .start_container(&response.id, None::<StartContainerOptions<String>>)
            .await
        {
            // A created container would hold the name without ever serving
            let remove = Some(RemoveContainerOptions {
                force: true,
                ..Default::default()
            });
            if let Err(remove_err) = self.docker.remove_container(&response.id, remove).await {
                warn!(container = name, error = %remove_err, "Unable to remove unstarted container");
            }
            return Err(e.into());
        }
        Ok(response.id)
    }

    async fn collect_logs(&self, name: &str) -> EngineResult<(Vec<u8>, Vec<u8>)> {
        let options = Some(LogsOptions::<String> {
            stdout: true,
            stderr: true,
            follow: false,
            ..Default::default()
        });

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut stream = self.docker.logs(name, options);
        while let Some(chunk) = stream.next().await {
            match chunk? {
                LogOutput::StdOut { message } | LogOutput::Console { message } => {
                    stdout.extend_from_slice(&message);
                }
                LogOutput::StdErr { message } => stderr.extend_from_slice(&message),
                LogOutput::StdIn { .. } => {}
            }
        }
        Ok((stdout, stderr))
    }
}

fn strip_name(name: &str) -> String {
    name.trim_start_matches('/').to_string()
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn list_containers(&self) -> EngineResult<Vec<ContainerSummary>> {
        let options = Some(ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        });
        let containers = self.docker.list_containers(options).await?;

        Ok(containers
            .into_iter()
            .flat_map(|c| {
                let id = c.id.unwrap_or_default();
                let state = ContainerState::parse(c.state.as_deref().unwrap_or_default());
                c.names
                    .unwrap_or_default()
                    .into_iter()
                    .map(move |name| ContainerSummary {
                        id: id.clone(),
                        name: strip_name(&name),
                        state,
                    })
            })
            .collect())
    }

    async fn launch(&self, spec: &LaunchSpec) -> EngineResult<ContainerSummary> {
        self.ensure_image(&spec.image).await?;

        let host_config = HostConfig {
            binds: if spec.binds.is_empty() {
                None
            } else {
                Some(spec.binds.clone())
            },
            memory: Some(spec.memory_limit_bytes),
            network_mode: Some(spec.network.clone()),
            ..Default::default()
        };
        let config = Config {
            image: Some(spec.image.clone()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            host_config: Some(host_config),
            ..Default::default()
        };

        let id = self.create_and_start(&spec.name, config).await?;
        debug!(container = %spec.name, id = %id, "container started");

        Ok(ContainerSummary {
            id,
            name: spec.name.clone(),
            state: ContainerState::Running,
        })
    }

    async fn inspect(&self, name: &str) -> EngineResult<ContainerDetails> {
        let response = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await?;

        let state = response
            .state
            .as_ref()
            .and_then(|s| s.status.as_ref().map(ToString::to_string))
            .map_or(ContainerState::Unknown, |status| ContainerState::parse(&status));

        let networks: HashMap<String, Option<String>> = response
            .network_settings
            .and_then(|settings| settings.networks)
            .unwrap_or_default()
            .into_iter()
            .map(|(network, endpoint)| {
                let ip = endpoint.ip_address.filter(|ip| !ip.is_empty());
                (network, ip)
            })
            .collect();

        Ok(ContainerDetails {
            id: response.id.unwrap_or_default(),
            name: strip_name(response.name.as_deref().unwrap_or(name)),
            state,
            image: response.image,
            networks,
        })
    }

    async fn run_to_completion(&self, spec: &RunSpec) -> EngineResult<RunOutput> {
        self.ensure_image(&spec.image).await?;

        let host_config = HostConfig {
            binds: if spec.binds.is_empty() {
                None
            } else {
                Some(spec.binds.clone())
            },
            network_mode: Some(spec.network.clone()),
            ..Default::default()
        };
        let config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.cmd.clone()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            host_config: Some(host_config),
            ..Default::default()
        };

        let id = self.create_and_start(&spec.name, config).await?;

        let mut wait = self.docker.wait_container(
            &id,
            Some(WaitContainerOptions {
                condition: "not-running",
            }),
        );
        let exit_code = match wait.next().await {
            Some(Ok(response)) => response.status_code,
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => code,
            Some(Err(e)) => return Err(e.into()),
            None => {
                return Err(EngineError::Api(format!(
                    "wait stream for {} ended without a status",
                    spec.name
                )))
            }
        };

        let (stdout, stderr) = self.collect_logs(&id).await?;
        Ok(RunOutput {
            exit_code,
            stdout,
            stderr,
        })
    }

    async fn stop_container(&self, name: &str) -> EngineResult<()> {
        self.docker
            .stop_container(name, Some(StopContainerOptions { t: STOP_TIMEOUT_SECS }))
            .await?;
        Ok(())
    }

    async fn remove_container(&self, name: &str, force: bool) -> EngineResult<()> {
        self.docker
            .remove_container(
                name,
                Some(RemoveContainerOptions {
                    force,
                    ..Default::default()
                }),
            )
            .await?;
        Ok(())
    }

    async fn remove_image(&self, reference: &str, force: bool) -> EngineResult<()> {
        self.docker
            .remove_image(
                reference,
                Some(RemoveImageOptions {
                    force,
                    ..Default::default()
                }),
                None,
            )
            .await?;
        Ok(())
    }

    async fn logs(&self, name: &str) -> EngineResult<Vec<u8>> {
        let (mut stdout, stderr) = self.collect_logs(name).await?;
        stdout.extend_from_slice(&stderr);
        Ok(stdout)
    }
}
