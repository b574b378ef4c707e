//! Readiness polling for freshly launched submissions.

use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{HttpRequest, ProbeRequest, ReadinessConfig, SubmissionId};
use crate::services::probe_executor::ProbeExecutor;

/// Bounded exponential backoff over a health endpoint.
#[derive(Debug, Clone)]
pub struct ReadinessPolicy {
    pub health_path: String,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub max_elapsed: Duration,
}

impl From<&ReadinessConfig> for ReadinessPolicy {
    fn from(config: &ReadinessConfig) -> Self {
        Self {
            health_path: config.health_path.clone(),
            initial_interval: Duration::from_millis(config.initial_backoff_ms),
            max_interval: Duration::from_millis(config.max_backoff_ms),
            max_elapsed: Duration::from_secs(config.max_wait_secs),
        }
    }
}

/// Poll `<api_base>/<health_path>` from a sidecar until it answers 2xx.
pub async fn wait_until_ready(
    executor: &ProbeExecutor,
    policy: &ReadinessPolicy,
    submission: &SubmissionId,
    client_image: &str,
    api_base: &str,
) -> OrchestratorResult<()> {
    let probe_name = submission.sidecar_name("ready");
    let url = format!("{}/{}", api_base, policy.health_path.trim_start_matches('/'));
    let request = ProbeRequest::new(
        probe_name.as_str(),
        client_image,
        HttpRequest::get(url.clone()).to_curl_args(),
    );

    let backoff = ExponentialBackoffBuilder::new()
        .with_initial_interval(policy.initial_interval)
        .with_max_interval(policy.max_interval)
        .with_max_elapsed_time(Some(policy.max_elapsed))
        .build();

    let mut attempts = 0u32;
    let request = &request;
    let outcome = retry(backoff, || {
        attempts += 1;
        debug!(attempt = attempts, url = %url, "polling readiness");
        async move {
            executor
                .probe(request)
                .await
                .map(|_| ())
                .map_err(backoff::Error::transient)
        }
    })
    .await;

    match outcome {
        Ok(()) => {
            info!(url = %url, attempts, "service is ready");
            Ok(())
        }
        Err(e) => {
            debug!(error = %e, "readiness budget exhausted");
            Err(OrchestratorError::ServiceNotReady {
                container: submission.to_string(),
                waited_secs: policy.max_elapsed.as_secs(),
            })
        }
    }
}
