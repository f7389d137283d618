use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::container::{Container, ContainerID, normalize_name};
use crate::docker::Runtime;

use super::{Error, Result};

/// The set of containers known to the monitor.
#[derive(Debug, Default)]
pub struct Registry {
    containers: Mutex<HashMap<ContainerID, Arc<Container>>>,
}

impl Registry {
    /// Returns the registered container for `id`, inspecting and registering it first if
    /// it is unknown. The flag is `true` if the container was registered by this call.
    ///
    /// The registry stays locked while the container is inspected, so concurrent callers
    /// asking for the same unknown ID cause a single inspection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inspection`] if the runtime cannot resolve `id`.
    pub async fn get_or_register<R: Runtime>(
        &self,
        runtime: &R,
        id: &ContainerID,
    ) -> Result<(Arc<Container>, bool)> {
        let mut containers = self.containers.lock().await;
        if let Some(container) = containers.get(id) {
            return Ok((Arc::clone(container), false));
        }

        let details = runtime
            .inspect_container(id)
            .await
            .map_err(|source| Error::Inspection {
                id: id.clone(),
                source,
            })?;
        let container = Arc::new(Container::new(
            id.clone(),
            normalize_name(&details.name),
            details.env,
        ));
        containers.insert(id.clone(), Arc::clone(&container));
        log::debug!("registered container `{}` ({})", container.name(), id);

        Ok((container, true))
    }

    pub async fn get(&self, id: &ContainerID) -> Option<Arc<Container>> {
        self.containers.lock().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &ContainerID) -> Option<Arc<Container>> {
        self.containers.lock().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.containers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.containers.lock().await.is_empty()
    }
}
