use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::CartConfig;
use crate::coordinator::{CartCoordinator, CartError};
use crate::remote::{HttpCartService, RemoteCartService};
use crate::server_actor::ServerCartActor;
use crate::store::{FileStore, LocalStore};
use crate::sync_actor::SyncActor;

const SERVER_BUFFER_SIZE: usize = 32;

/// The running cart engine: a coordinator plus the background tasks it relies on.
///
/// # Example
///
/// ```ignore
/// let system = CartSystem::start(MemoryStore::new(), HttpCartService::new(url, token, 10)?);
///
/// system.coordinator.add_to_cart(CartItem::new("p1", "Tee", 20.0), 2)?;
/// system.coordinator.set_authenticated(true).await;
///
/// system.shutdown().await?;
/// ```
pub struct CartSystem<L: LocalStore + 'static> {
    /// The cart API for UI callers
    pub coordinator: Arc<CartCoordinator<L>>,

    /// Background tasks, in shutdown order
    handles: Vec<JoinHandle<()>>,
}

impl<L: LocalStore + 'static> CartSystem<L> {
    /// Starts the sync actor against `service` and builds the coordinator over `store`.
    pub fn start<S: RemoteCartService>(store: L, service: S) -> Self {
        let (sync_actor, sync_client) = SyncActor::new();
        let sync_handle = tokio::spawn(sync_actor.run(service));

        Self {
            coordinator: Arc::new(CartCoordinator::new(store, sync_client)),
            handles: vec![sync_handle],
        }
    }

    /// Like [`start`](Self::start), with an in-process server cart acting for `user_id`.
    pub fn with_server(store: L, user_id: &str) -> Self {
        let (server_actor, server_client) = ServerCartActor::new(SERVER_BUFFER_SIZE);
        let server_handle = tokio::spawn(server_actor.run());

        let mut system = Self::start(store, server_client.for_user(user_id));
        // The sync actor must stop before the server it talks to.
        system.handles.push(server_handle);
        system
    }

    /// Gracefully shuts down the background tasks.
    ///
    /// Dropping the coordinator closes the sync actor's channel; the actor
    /// finishes what is queued and exits, which in turn releases the server
    /// cart client.
    ///
    /// # Errors
    ///
    /// [`CartError::Shutdown`] if the coordinator is still shared elsewhere
    /// or a background task panicked.
    pub async fn shutdown(self) -> Result<(), CartError> {
        info!("Shutting down cart system...");

        let coordinator = Arc::try_unwrap(self.coordinator).map_err(|shared| {
            CartError::Shutdown(format!(
                "coordinator still has {} other references",
                Arc::strong_count(&shared) - 1
            ))
        })?;
        drop(coordinator);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Background task failed: {:?}", e);
                return Err(CartError::Shutdown(format!("background task failed: {e:?}")));
            }
        }

        info!("Cart system shutdown complete.");
        Ok(())
    }
}

impl CartSystem<FileStore> {
    /// Builds a system from configuration: a [`FileStore`] plus either the
    /// configured REST service or the in-process server cart.
    ///
    /// # Errors
    ///
    /// [`CartError::Remote`] if the HTTP client cannot be built.
    pub fn from_config(config: &CartConfig) -> Result<Self, CartError> {
        let store = FileStore::with_key(&config.store_dir, &config.store_key);
        match &config.api {
            Some(api) => {
                let service = HttpCartService::new(&api.base_url, api.token.clone(), api.timeout_secs)?;
                info!(base_url = %api.base_url, "Using remote cart service");
                Ok(Self::start(store, service))
            }
            None => {
                info!(user_id = %config.user_id, "Using in-process server cart");
                Ok(Self::with_server(store, &config.user_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::SyncOutcome;
    use crate::model::CartItem;
    use crate::remote::mock::{MockCartService, RemoteCall};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_shutdown_drains_queued_mirrors() {
        let mock = MockCartService::new();
        mock.expect_fetch().return_ok(Vec::new());
        let system = CartSystem::start(MemoryStore::new(), mock.clone());

        system.coordinator.set_authenticated(true).await;
        system
            .coordinator
            .add_one(CartItem::new("p1", "Tee", 20.0))
            .unwrap();
        system.shutdown().await.unwrap();

        assert_eq!(mock.calls().len(), 2);
        assert!(matches!(mock.calls()[1], RemoteCall::Add(_)));
        mock.verify();
    }

    #[tokio::test]
    async fn test_shutdown_refuses_shared_coordinator() {
        let system = CartSystem::with_server(MemoryStore::new(), "u1");
        let _extra = system.coordinator.clone();
        assert!(matches!(
            system.shutdown().await,
            Err(CartError::Shutdown(_))
        ));
    }

    #[tokio::test]
    async fn test_from_config_without_api_uses_server_cart() {
        let dir = tempfile::tempdir().unwrap();
        let config = CartConfig {
            store_dir: dir.path().to_path_buf(),
            ..CartConfig::default()
        };
        let system = CartSystem::from_config(&config).unwrap();
        assert_eq!(
            system.coordinator.set_authenticated(true).await,
            Some(SyncOutcome::Refreshed { lines: 0 })
        );
        system.shutdown().await.unwrap();
    }
}
