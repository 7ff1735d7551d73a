use coordinator::ResourceCoordinator;
use db::{Catalog, ResourceRepository, StateRepository, StatusStore};
use events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::fulfiller::LocalFulfiller;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ResourceCoordinator>,
    pub catalog: Arc<dyn Catalog>,
    pub status_store: Arc<dyn StatusStore>,
    pub event_bus: EventBus,
}

impl AppState {
    /// State backed by the SQLite catalog and status tables in `pool`.
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Self {
        Self::with_stores(
            Arc::new(ResourceRepository::new(pool.clone())),
            Arc::new(StateRepository::new(pool)),
            config,
        )
    }

    /// Wire a coordinator over the given stores. Hook events go out on a
    /// fresh event bus; with `fulfillment.local` set a [`LocalFulfiller`]
    /// is subscribed to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_stores(
        catalog: Arc<dyn Catalog>,
        status_store: Arc<dyn StatusStore>,
        config: &AppConfig,
    ) -> Self {
        let event_bus = EventBus::new();

        if config.fulfillment.local {
            LocalFulfiller::new(Arc::clone(&catalog), Arc::clone(&status_store))
                .with_delay(config.fulfillment.delay())
                .spawn(&event_bus);
            tracing::info!(
                delay_ms = config.fulfillment.delay_ms,
                "Local fulfiller attached"
            );
        }

        let coordinator = ResourceCoordinator::new(
            config.to_coordinator_config(),
            Arc::new(event_bus.clone()),
        )
        .with_catalog(Arc::clone(&catalog))
        .with_status_store(Arc::clone(&status_store))
        .with_event_bus(event_bus.clone());

        Self {
            coordinator: Arc::new(coordinator),
            catalog,
            status_store,
            event_bus,
        }
    }
}
