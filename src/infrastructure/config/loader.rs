use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Default project config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "harness.yaml";

/// Prefix of environment overrides, e.g. `HARNESS_ENGINE__NETWORK`
pub const ENV_PREFIX: &str = "HARNESS_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid memory_limit_mb: {0}. Must be at least 1 and at most 8796093022207")]
    InvalidMemoryLimit(u64),

    #[error("Invalid service_port: {0}. Cannot be 0")]
    InvalidServicePort(u16),

    #[error("Network name cannot be empty")]
    EmptyNetwork,

    #[error("Probe image '{0}' cannot be empty")]
    EmptyImage(&'static str),

    #[error("Invalid probe timeout_secs: {0}. Must be at least 1")]
    InvalidProbeTimeout(u64),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid max_upload_bytes: {0}. Must be at least 1")]
    InvalidUploadCap(u64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `path` if given, otherwise ./harness.yaml when present
    /// 3. Environment variables (HARNESS_* prefix, `__` separates sections)
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let file = match path {
            Some(p) => {
                anyhow::ensure!(p.exists(), "Config file {} does not exist", p.display());
                p.to_path_buf()
            }
            None => Path::new(DEFAULT_CONFIG_FILE).to_path_buf(),
        };

        let config: Config = Self::figment(&file)
            .extract()
            .with_context(|| format!("Failed to load config from {}", file.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.engine.memory_limit_mb == 0 || config.engine.memory_limit_bytes().is_none() {
            return Err(ConfigError::InvalidMemoryLimit(config.engine.memory_limit_mb));
        }
        if config.engine.service_port == 0 {
            return Err(ConfigError::InvalidServicePort(0));
        }
        if config.engine.network.trim().is_empty() {
            return Err(ConfigError::EmptyNetwork);
        }
        if !config.engine.output_mount.starts_with('/') {
            return Err(ConfigError::ValidationFailed(format!(
                "output_mount '{}' must be an absolute container path",
                config.engine.output_mount
            )));
        }

        if config.probes.http_client_image.trim().is_empty() {
            return Err(ConfigError::EmptyImage("http_client_image"));
        }
        if config.probes.conformance_image.trim().is_empty() {
            return Err(ConfigError::EmptyImage("conformance_image"));
        }
        if config.probes.timeout_secs == 0 {
            return Err(ConfigError::InvalidProbeTimeout(0));
        }

        if config.readiness.initial_backoff_ms >= config.readiness.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.readiness.initial_backoff_ms,
                config.readiness.max_backoff_ms,
            ));
        }

        if config.submission_log.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidUploadCap(0));
        }

        Ok(())
    }
}
