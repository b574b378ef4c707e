//! Best-effort removal of containers and images.
//!
//! Nothing here returns an error: failures are logged and dropped so cleanup
//! never changes the outcome a run reports.

use tracing::{debug, warn};

use crate::domain::ports::ContainerEngine;

/// Stop and force-remove a container.
pub async fn remove_container(engine: &dyn ContainerEngine, name: &str) {
    match engine.stop_container(name).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            debug!(container = name, "container already gone");
            return;
        }
        Err(e) => debug!(container = name, error = %e, "stop failed, forcing removal"),
    }

    match engine.remove_container(name, true).await {
        Ok(()) => debug!(container = name, "container removed"),
        Err(e) if e.is_not_found() => debug!(container = name, "container already gone"),
        Err(e) => warn!(container = name, error = %e, "Unable to remove container"),
    }
}

/// Force-remove an image.
pub async fn remove_image(engine: &dyn ContainerEngine, reference: &str) {
    match engine.remove_image(reference, true).await {
        Ok(()) => debug!(image = reference, "image removed"),
        Err(e) => warn!(image = reference, error = %e, "Unable to remove image"),
    }
}
