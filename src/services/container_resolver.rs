//! Container handle resolver.
//!
//! Finds the container belonging to a submission or launches one. Lookups
//! are exact: first the resolver's own registry, then the engine listing
//! matched by full name.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{ContainerHandle, EngineConfig, Submission, SubmissionId};
use crate::domain::ports::{ContainerEngine, LaunchSpec};
use crate::services::cleanup;
use crate::services::network;
use crate::services::probe_executor::ProbeExecutor;
use crate::services::readiness::{self, ReadinessPolicy};

/// Launch parameters shared by every submission container.
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub network: String,
    pub memory_limit_bytes: i64,
    /// Bind mounts in `host:container:mode` form
    pub binds: Vec<String>,
    pub service_port: u16,
    pub api_base_path: String,
    /// Image used for readiness polling
    pub client_image: String,
}

impl LaunchSettings {
    /// `None` when the configured memory ceiling is out of range.
    pub fn from_config(engine: &EngineConfig, client_image: &str, binds: Vec<String>) -> Option<Self> {
        Some(Self {
            network: engine.network.clone(),
            memory_limit_bytes: engine.memory_limit_bytes()?,
            binds,
            service_port: engine.service_port,
            api_base_path: engine.api_base_path.clone(),
            client_image: client_image.to_string(),
        })
    }
}

/// Resolves submission ids to container handles, owning a registry of the
/// handles it has produced.
pub struct ContainerResolver {
    engine: Arc<dyn ContainerEngine>,
    settings: LaunchSettings,
    readiness: ReadinessPolicy,
    probes: ProbeExecutor,
    registry: HashMap<SubmissionId, ContainerHandle>,
}

impl ContainerResolver {
    pub fn new(
        engine: Arc<dyn ContainerEngine>,
        settings: LaunchSettings,
        readiness: ReadinessPolicy,
        probes: ProbeExecutor,
    ) -> Self {
        Self {
            engine,
            settings,
            readiness,
            probes,
            registry: HashMap::new(),
        }
    }

    /// Return the live container for `submission`, launching it if needed.
    #[instrument(skip(self, submission), fields(submission_id = %submission.id))]
    pub async fn resolve(&mut self, submission: &Submission) -> OrchestratorResult<ContainerHandle> {
        if let Some(handle) = self.find(&submission.id).await? {
            info!(container = %handle.name, "reusing existing container");
            return Ok(handle);
        }

        let handle = self.launch(submission).await?;
        self.wait_until_ready(&submission.id, &handle).await?;
        Ok(handle)
    }

    /// Look up a live container for `id` without launching one.
    ///
    /// Stale (created but never started, exited or dead) containers with the
    /// exact name are removed.
    pub async fn find(&mut self, id: &SubmissionId) -> OrchestratorResult<Option<ContainerHandle>> {
        if let Some(handle) = self.registry.get(id).cloned() {
            match self.engine.inspect(&handle.name).await {
                Ok(details) if !details.state.is_stale() => return Ok(Some(handle)),
                Ok(details) => {
                    warn!(container = %handle.name, state = %details.state, "registered container is stale");
                    cleanup::remove_container(self.engine.as_ref(), &handle.name).await;
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
            self.registry.remove(id);
        }

        let containers = self.engine.list_containers().await?;
        for container in containers.into_iter().filter(|c| c.name == id.as_str()) {
            if container.state.is_stale() {
                info!(container = %container.name, state = %container.state, "removing stale container");
                match self.engine.remove_container(&container.name, true).await {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {
                        debug!(container = %container.name, "stale container already gone");
                    }
                    Err(e) => return Err(e.into()),
                }
                continue;
            }

            let details = self.engine.inspect(&container.name).await?;
            let handle = ContainerHandle {
                name: container.name,
                id: container.id,
                image: details.image,
            };
            self.registry.insert(id.clone(), handle.clone());
            return Ok(Some(handle));
        }

        Ok(None)
    }

    /// Forget a handle after its container has been cleaned up.
    pub fn release(&mut self, id: &SubmissionId) -> Option<ContainerHandle> {
        self.registry.remove(id)
    }

    async fn launch(&mut self, submission: &Submission) -> OrchestratorResult<ContainerHandle> {
        let image = submission.image.to_string();
        let spec = LaunchSpec {
            name: submission.id.to_string(),
            image: image.clone(),
            network: self.settings.network.clone(),
            binds: self.settings.binds.clone(),
            memory_limit_bytes: self.settings.memory_limit_bytes,
        };

        info!(image = %image, network = %spec.network, "starting service");
        let summary = self
            .engine
            .launch(&spec)
            .await
            .map_err(|e| OrchestratorError::ContainerLaunch {
                name: spec.name.clone(),
                image: image.clone(),
                reason: e.to_string(),
            })?;

        let handle = ContainerHandle {
            name: summary.name,
            id: summary.id,
            image: Some(image),
        };
        self.registry.insert(submission.id.clone(), handle.clone());
        Ok(handle)
    }

    async fn wait_until_ready(
        &self,
        id: &SubmissionId,
        handle: &ContainerHandle,
    ) -> OrchestratorResult<()> {
        let address = network::address_of(self.engine.as_ref(), handle, &self.settings.network).await?;
        let api_base = address.api_base(self.settings.service_port, &self.settings.api_base_path);
        readiness::wait_until_ready(
            &self.probes,
            &self.readiness,
            id,
            &self.settings.client_image,
            &api_base,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockEngine;
    use crate::domain::models::{ContainerState, ImageRef};
    use std::time::Duration;

    fn resolver(engine: &MockEngine) -> ContainerResolver {
        let engine: Arc<dyn ContainerEngine> = Arc::new(engine.clone());
        let settings = LaunchSettings {
            network: "submission".to_string(),
            memory_limit_bytes: 6 * 1024 * 1024 * 1024,
            binds: vec!["/tmp/work:/output:rw".to_string()],
            service_port: 8080,
            api_base_path: "/api/v1".to_string(),
            client_image: "curlimages/curl:7.73.0".to_string(),
        };
        let readiness = ReadinessPolicy {
            health_path: "healthCheck".to_string(),
            initial_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(10),
            max_elapsed: Duration::from_millis(100),
        };
        let probes = ProbeExecutor::new(engine.clone(), "submission", Duration::from_secs(1));
        ContainerResolver::new(engine, settings, readiness, probes)
    }

    fn submission(id: &str) -> Submission {
        Submission {
            id: SubmissionId::new(id).unwrap(),
            image: ImageRef::new("repo/annotator", "sha256:1234"),
        }
    }

    /// Removed containers, leaving out the readiness sidecar of a fresh launch.
    async fn removed_besides_readiness(engine: &MockEngine, id: &str) -> Vec<String> {
        let sidecar = SubmissionId::new(id).unwrap().sidecar_name("ready");
        engine
            .removed_containers()
            .await
            .into_iter()
            .filter(|name| *name != sidecar)
            .collect()
    }

    #[tokio::test]
    async fn test_launch_uses_declared_settings() {
        let engine = MockEngine::new();
        let handle = resolver(&engine).resolve(&submission("9712345")).await.unwrap();

        assert_eq!(handle.name, "9712345");
        let launches = engine.launches().await;
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].image, "repo/annotator@sha256:1234");
        assert_eq!(launches[0].network, "submission");
        assert_eq!(launches[0].binds, vec!["/tmp/work:/output:rw"]);
        assert_eq!(launches[0].memory_limit_bytes, 6 * 1024 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_running_container_is_adopted() {
        let engine = MockEngine::new();
        engine
            .insert_container("9712345", ContainerState::Running, "submission")
            .await;

        let handle = resolver(&engine).resolve(&submission("9712345")).await.unwrap();

        assert_eq!(handle.name, "9712345");
        assert_eq!(handle.image.as_deref(), Some("sha256:9712345"));
        assert!(engine.launches().await.is_empty());
    }

    #[tokio::test]
    async fn test_exited_container_is_replaced() {
        let engine = MockEngine::new();
        engine
            .insert_container("9712345", ContainerState::Exited, "submission")
            .await;

        let handle = resolver(&engine).resolve(&submission("9712345")).await.unwrap();

        assert_eq!(
            removed_besides_readiness(&engine, "9712345").await,
            vec!["9712345"]
        );
        assert_eq!(engine.launches().await.len(), 1);
        assert_eq!(
            engine.container_state(&handle.name).await,
            Some(ContainerState::Running)
        );
    }

    #[tokio::test]
    async fn test_stale_container_already_gone_is_not_fatal() {
        let engine = MockEngine::new();
        engine
            .insert_container("9712345", ContainerState::Exited, "submission")
            .await;
        engine.vanish_on_remove("9712345").await;

        let handle = resolver(&engine).resolve(&submission("9712345")).await.unwrap();

        assert_eq!(handle.name, "9712345");
        assert_eq!(engine.launches().await.len(), 1);
        assert_eq!(
            engine.container_state("9712345").await,
            Some(ContainerState::Running)
        );
    }

    #[tokio::test]
    async fn test_created_container_is_never_adopted() {
        let engine = MockEngine::new();
        engine
            .insert_container("9712345", ContainerState::Created, "submission")
            .await;

        let found = resolver(&engine)
            .find(&SubmissionId::new("9712345").unwrap())
            .await
            .unwrap();

        assert!(found.is_none());
        assert!(engine.container_state("9712345").await.is_none());
        assert_eq!(engine.removed_containers().await, vec!["9712345"]);
    }

    #[tokio::test]
    async fn test_substring_ids_do_not_alias() {
        let engine = MockEngine::new();
        engine
            .insert_container("97123456", ContainerState::Running, "submission")
            .await;
        engine
            .insert_container("x9712345", ContainerState::Running, "submission")
            .await;

        let handle = resolver(&engine).resolve(&submission("9712345")).await.unwrap();

        assert_eq!(handle.name, "9712345");
        assert_eq!(engine.launches().await.len(), 1);
        assert!(removed_besides_readiness(&engine, "9712345").await.is_empty());
        assert_eq!(
            engine.container_state("97123456").await,
            Some(ContainerState::Running)
        );
    }

    #[tokio::test]
    async fn test_second_resolve_reuses_handle() {
        let engine = MockEngine::new();
        let mut resolver = resolver(&engine);
        let sub = submission("9712345");

        let first = resolver.resolve(&sub).await.unwrap();
        let second = resolver.resolve(&sub).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.launches().await.len(), 1);
    }

    #[tokio::test]
    async fn test_launch_failure_is_container_launch_error() {
        let engine = MockEngine::new();
        engine.fail_launches("pull access denied").await;

        let err = resolver(&engine)
            .resolve(&submission("9712345"))
            .await
            .unwrap_err();

        match err {
            OrchestratorError::ContainerLaunch { name, reason, .. } => {
                assert_eq!(name, "9712345");
                assert!(reason.contains("pull access denied"));
            }
            other => panic!("Expected ContainerLaunch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_registry_drops_container_removed_externally() {
        let engine = MockEngine::new();
        let mut resolver = resolver(&engine);
        let id = submission("9712345");

        resolver.resolve(&id).await.unwrap();
        engine.remove_container("9712345", true).await.unwrap();
        resolver.resolve(&id).await.unwrap();

        assert_eq!(engine.launches().await.len(), 2);
    }

    #[tokio::test]
    async fn test_find_does_not_launch() {
        let engine = MockEngine::new();
        let found = resolver(&engine)
            .find(&SubmissionId::new("9712345").unwrap())
            .await
            .unwrap();

        assert!(found.is_none());
        assert!(engine.launches().await.is_empty());
    }

    #[tokio::test]
    async fn test_release_forgets_handle() {
        let engine = MockEngine::new();
        let mut resolver = resolver(&engine);
        let sub = submission("9712345");

        resolver.resolve(&sub).await.unwrap();
        assert!(resolver.release(&sub.id).is_some());
        assert!(resolver.release(&sub.id).is_none());
    }
}
