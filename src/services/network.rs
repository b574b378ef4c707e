//! Network address discovery.

use tracing::debug;

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{ContainerHandle, NetworkAddress};
use crate::domain::ports::ContainerEngine;

/// Private address of `handle` on `network`, read from live attributes.
///
/// A missing attachment is a configuration defect and is never retried.
pub async fn address_of(
    engine: &dyn ContainerEngine,
    handle: &ContainerHandle,
    network: &str,
) -> OrchestratorResult<NetworkAddress> {
    let details = engine.inspect(&handle.name).await?;

    let not_attached = || OrchestratorError::NetworkNotAttached {
        container: handle.name.clone(),
        network: network.to_string(),
    };

    let ip = details
        .networks
        .get(network)
        .cloned()
        .flatten()
        .ok_or_else(not_attached)?;
    let ip = ip.parse().map_err(|_| not_attached())?;

    debug!(container = %handle.name, %ip, "resolved container address");
    Ok(NetworkAddress { ip })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockEngine;
    use crate::domain::models::ContainerState;

    fn handle(name: &str) -> ContainerHandle {
        ContainerHandle {
            name: name.to_string(),
            id: String::new(),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_address_on_submission_network() {
        let engine = MockEngine::new();
        engine
            .insert_container("s1", ContainerState::Running, "submission")
            .await;

        let addr = address_of(&engine, &handle("s1"), "submission").await.unwrap();
        assert!(addr.ip.is_ipv4());
    }

    #[tokio::test]
    async fn test_other_network_is_not_attached() {
        let engine = MockEngine::new();
        engine
            .insert_container("s1", ContainerState::Running, "bridge")
            .await;

        let err = address_of(&engine, &handle("s1"), "submission")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NetworkNotAttached { .. }));
    }

    #[tokio::test]
    async fn test_missing_container_is_engine_error() {
        let engine = MockEngine::new();
        let err = address_of(&engine, &handle("ghost"), "submission")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Engine(_)));
    }
}
