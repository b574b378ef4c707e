//! In-memory container engine for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::ContainerState;
use crate::domain::ports::{
    ContainerDetails, ContainerEngine, ContainerSummary, LaunchSpec, RunOutput, RunSpec,
};

/// Scripted outcome of a run-to-completion container.
#[derive(Debug, Clone, Default)]
pub struct MockRun {
    pub exit_code: i64,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Simulated run time
    pub delay: Option<Duration>,
    /// File written through a bind mount: container path and contents
    pub mounted_output: Option<(String, Vec<u8>)>,
    /// Fail after the container was created
    pub engine_error: Option<EngineError>,
}

impl MockRun {
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    pub fn failure(exit_code: i64, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code,
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    pub fn engine_error(error: EngineError) -> Self {
        Self {
            engine_error: Some(error),
            ..Default::default()
        }
    }

    /// Successful run that writes `contents` to `container_path`.
    pub fn writes_file(container_path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            mounted_output: Some((container_path.into(), contents.into())),
            ..Default::default()
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone)]
struct MockContainer {
    id: String,
    state: ContainerState,
    image: String,
    networks: HashMap<String, Option<String>>,
    logs: Vec<u8>,
}

#[derive(Debug, Default)]
struct MockState {
    containers: HashMap<String, MockContainer>,
    scripted_runs: HashMap<String, VecDeque<MockRun>>,
    default_run: MockRun,
    launches: Vec<LaunchSpec>,
    runs: Vec<RunSpec>,
    removed_containers: Vec<String>,
    removed_images: Vec<String>,
    launch_error: Option<String>,
    detached_launches: bool,
    /// Containers removed by someone else just before our removal lands
    vanishing: HashSet<String>,
    next_id: u32,
}

impl MockState {
    fn allocate(&mut self) -> (String, String) {
        self.next_id += 1;
        let id = format!("mock-{:08x}", self.next_id);
        let ip = format!("172.28.{}.{}", self.next_id / 250, self.next_id % 250 + 2);
        (id, ip)
    }
}

/// Container engine that keeps all state in memory.
#[derive(Clone, Default)]
pub struct MockEngine {
    state: Arc<RwLock<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing container attached to `network`.
    pub async fn insert_container(&self, name: &str, state: ContainerState, network: &str) {
        let mut s = self.state.write().await;
        let (id, ip) = s.allocate();
        s.containers.insert(
            name.to_string(),
            MockContainer {
                id,
                state,
                image: format!("sha256:{name}"),
                networks: HashMap::from([(network.to_string(), Some(ip))]),
                logs: Vec::new(),
            },
        );
    }

    /// Add an existing container with no network attachments.
    pub async fn insert_detached_container(&self, name: &str, state: ContainerState) {
        let mut s = self.state.write().await;
        let (id, _) = s.allocate();
        s.containers.insert(
            name.to_string(),
            MockContainer {
                id,
                state,
                image: format!("sha256:{name}"),
                networks: HashMap::new(),
                logs: Vec::new(),
            },
        );
    }

    pub async fn set_logs(&self, name: &str, logs: impl Into<Vec<u8>>) {
        if let Some(c) = self.state.write().await.containers.get_mut(name) {
            c.logs = logs.into();
        }
    }

    /// Queue the outcome of the next run with this container name.
    pub async fn queue_run(&self, name: &str, run: MockRun) {
        self.state
            .write()
            .await
            .scripted_runs
            .entry(name.to_string())
            .or_default()
            .push_back(run);
    }

    /// Outcome used when nothing is queued for a name.
    pub async fn set_default_run(&self, run: MockRun) {
        self.state.write().await.default_run = run;
    }

    /// Make every launch fail with `reason`.
    pub async fn fail_launches(&self, reason: impl Into<String>) {
        self.state.write().await.launch_error = Some(reason.into());
    }

    /// Launch containers without attaching them to any network.
    pub async fn launch_detached(&self) {
        self.state.write().await.detached_launches = true;
    }

    /// The next removal of `name` finds it already gone.
    pub async fn vanish_on_remove(&self, name: &str) {
        self.state.write().await.vanishing.insert(name.to_string());
    }

    pub async fn container_state(&self, name: &str) -> Option<ContainerState> {
        self.state.read().await.containers.get(name).map(|c| c.state)
    }

    pub async fn container_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().await.containers.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn launches(&self) -> Vec<LaunchSpec> {
        self.state.read().await.launches.clone()
    }

    pub async fn runs(&self) -> Vec<RunSpec> {
        self.state.read().await.runs.clone()
    }

    pub async fn removed_containers(&self) -> Vec<String> {
        self.state.read().await.removed_containers.clone()
    }

    pub async fn removed_images(&self) -> Vec<String> {
        self.state.read().await.removed_images.clone()
    }
}

/// Map a container path onto the host through `host:container[:mode]` binds.
fn host_path_for(binds: &[String], container_path: &str) -> Option<PathBuf> {
    binds.iter().find_map(|bind| {
        let mut parts = bind.splitn(3, ':');
        let host = parts.next()?;
        let mount = parts.next()?;
        let rest = container_path.strip_prefix(mount)?;
        Some(PathBuf::from(host).join(rest.trim_start_matches('/')))
    })
}

#[async_trait]
impl ContainerEngine for MockEngine {
    async fn list_containers(&self) -> EngineResult<Vec<ContainerSummary>> {
        let s = self.state.read().await;
        let mut containers: Vec<ContainerSummary> = s
            .containers
            .iter()
            .map(|(name, c)| ContainerSummary {
                id: c.id.clone(),
                name: name.clone(),
                state: c.state,
            })
            .collect();
        containers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(containers)
    }

    async fn launch(&self, spec: &LaunchSpec) -> EngineResult<ContainerSummary> {
        let mut s = self.state.write().await;
        if let Some(ref reason) = s.launch_error {
            return Err(EngineError::Api(reason.clone()));
        }
        if s.containers.contains_key(&spec.name) {
            return Err(EngineError::Conflict(format!(
                "container name {} is already in use",
                spec.name
            )));
        }

        let (id, ip) = s.allocate();
        let networks = if s.detached_launches {
            HashMap::new()
        } else {
            HashMap::from([(spec.network.clone(), Some(ip))])
        };
        s.containers.insert(
            spec.name.clone(),
            MockContainer {
                id: id.clone(),
                state: ContainerState::Running,
                image: spec.image.clone(),
                networks,
                logs: Vec::new(),
            },
        );
        s.launches.push(spec.clone());

        Ok(ContainerSummary {
            id,
            name: spec.name.clone(),
            state: ContainerState::Running,
        })
    }

    async fn inspect(&self, name: &str) -> EngineResult<ContainerDetails> {
        let s = self.state.read().await;
        let c = s
            .containers
            .get(name)
            .ok_or_else(|| EngineError::NotFound(name.to_string()))?;
        Ok(ContainerDetails {
            id: c.id.clone(),
            name: name.to_string(),
            state: c.state,
            image: Some(c.image.clone()),
            networks: c.networks.clone(),
        })
    }

    async fn run_to_completion(&self, spec: &RunSpec) -> EngineResult<RunOutput> {
        let run = {
            let mut s = self.state.write().await;
            if s.containers.contains_key(&spec.name) {
                return Err(EngineError::Conflict(format!(
                    "container name {} is already in use",
                    spec.name
                )));
            }
            s.runs.push(spec.clone());

            let (id, _) = s.allocate();
            s.containers.insert(
                spec.name.clone(),
                MockContainer {
                    id,
                    state: ContainerState::Exited,
                    image: spec.image.clone(),
                    networks: HashMap::new(),
                    logs: Vec::new(),
                },
            );

            let default_run = s.default_run.clone();
            s.scripted_runs
                .get_mut(&spec.name)
                .and_then(VecDeque::pop_front)
                .unwrap_or(default_run)
        };

        if let Some(delay) = run.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = run.engine_error {
            return Err(err);
        }
        if let Some((container_path, contents)) = run.mounted_output {
            let host_path = host_path_for(&spec.binds, &container_path).ok_or_else(|| {
                EngineError::Api(format!("{container_path} is not on a bind mount"))
            })?;
            tokio::fs::write(&host_path, contents)
                .await
                .map_err(|e| EngineError::Api(e.to_string()))?;
        }

        Ok(RunOutput {
            exit_code: run.exit_code,
            stdout: run.stdout,
            stderr: run.stderr,
        })
    }

    async fn stop_container(&self, name: &str) -> EngineResult<()> {
        let mut s = self.state.write().await;
        let c = s
            .containers
            .get_mut(name)
            .ok_or_else(|| EngineError::NotFound(name.to_string()))?;
        c.state = ContainerState::Exited;
        Ok(())
    }

    async fn remove_container(&self, name: &str, force: bool) -> EngineResult<()> {
        let mut s = self.state.write().await;
        if s.vanishing.remove(name) {
            s.containers.remove(name);
            return Err(EngineError::NotFound(name.to_string()));
        }
        let state = s
            .containers
            .get(name)
            .map(|c| c.state)
            .ok_or_else(|| EngineError::NotFound(name.to_string()))?;
        if state == ContainerState::Running && !force {
            return Err(EngineError::Conflict(format!(
                "cannot remove running container {name}"
            )));
        }
        s.containers.remove(name);
        s.removed_containers.push(name.to_string());
        Ok(())
    }

    async fn remove_image(&self, reference: &str, _force: bool) -> EngineResult<()> {
        self.state
            .write()
            .await
            .removed_images
            .push(reference.to_string());
        Ok(())
    }

    async fn logs(&self, name: &str) -> EngineResult<Vec<u8>> {
        let s = self.state.read().await;
        s.containers
            .get(name)
            .map(|c| c.logs.clone())
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }
}
