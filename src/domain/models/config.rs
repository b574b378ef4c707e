use serde::{Deserialize, Serialize};

/// Main configuration structure for the harness
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Container engine and submission container settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Sidecar probe images and limits
    #[serde(default)]
    pub probes: ProbeConfig,

    /// Readiness polling after a fresh launch
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Submission log capture and upload
    #[serde(default)]
    pub submission_log: SubmissionLogConfig,
}

/// Container engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Isolated network shared by the submission and its sidecars
    #[serde(default = "default_network")]
    pub network: String,

    /// Memory ceiling for the submission container, in MiB
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: u64,

    /// Port the annotator listens on inside the network
    #[serde(default = "default_service_port")]
    pub service_port: u16,

    /// API prefix of the annotator
    #[serde(default = "default_api_base_path")]
    pub api_base_path: String,

    /// Mount point of the work directory inside containers
    #[serde(default = "default_output_mount")]
    pub output_mount: String,
}

fn default_network() -> String {
    "submission".to_string()
}

const fn default_memory_limit_mb() -> u64 {
    6 * 1024
}

const fn default_service_port() -> u16 {
    8080
}

fn default_api_base_path() -> String {
    "/api/v1".to_string()
}

fn default_output_mount() -> String {
    "/output".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            memory_limit_mb: default_memory_limit_mb(),
            service_port: default_service_port(),
            api_base_path: default_api_base_path(),
            output_mount: default_output_mount(),
        }
    }
}

impl EngineConfig {
    /// Memory ceiling in bytes, `None` when it does not fit the engine's
    /// signed byte count.
    pub fn memory_limit_bytes(&self) -> Option<i64> {
        self.memory_limit_mb
            .checked_mul(1024 * 1024)
            .and_then(|bytes| i64::try_from(bytes).ok())
    }
}

/// Sidecar probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProbeConfig {
    /// Plain HTTP client image
    #[serde(default = "default_http_client_image")]
    pub http_client_image: String,

    /// Conformance CLI image used by `validate`
    #[serde(default = "default_conformance_image")]
    pub conformance_image: String,

    /// Upper bound for a single probe, in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_http_client_image() -> String {
    "curlimages/curl:7.73.0".to_string()
}

fn default_conformance_image() -> String {
    "nlpsandbox/cli:edge".to_string()
}

const fn default_probe_timeout_secs() -> u64 {
    120
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            http_client_image: default_http_client_image(),
            conformance_image: default_conformance_image(),
            timeout_secs: default_probe_timeout_secs(),
        }
    }
}

/// Readiness polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReadinessConfig {
    /// Endpoint under the API base polled until it answers 2xx
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// First backoff interval in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Largest backoff interval in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Total time budget in seconds
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

fn default_health_path() -> String {
    "healthCheck".to_string()
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    10_000
}

const fn default_max_wait_secs() -> u64 {
    60
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            health_path: default_health_path(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for a JSON log file
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Submission log capture and upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SubmissionLogConfig {
    /// Largest log file that is uploaded, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Root directory of the log store
    #[serde(default = "default_storage_root")]
    pub storage_root: String,
}

const fn default_max_upload_bytes() -> u64 {
    50_000
}

fn default_storage_root() -> String {
    ".harness/logs".to_string()
}

impl Default for SubmissionLogConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            storage_root: default_storage_root(),
        }
    }
}
