//! Server state

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::scheduler::Scheduler;
use crate::services::{RolloverTimer, SettingsCache};
use crate::store::{MemoryStore, Store};
use shared::models::Category;

/// Shared server state: one handle per service singleton, cloned into
/// every request via axum `State`.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Record store
    pub store: Arc<dyn Store>,
    /// Scheduler core
    pub scheduler: Arc<Scheduler>,
    /// Settings cache
    pub settings: Arc<SettingsCache>,
    /// Post-completion reset timer
    pub rollover: Arc<RolloverTimer>,
}

impl ServerState {
    /// Initialize server state.
    ///
    /// Order: category table validation, store, settings cache,
    /// scheduler, rollover timer.
    ///
    /// # Panics
    ///
    /// Panics when the category routing table is inconsistent or the
    /// settings record cannot be read; neither is recoverable at
    /// startup.
    pub async fn initialize(config: &Config, shutdown: CancellationToken) -> Self {
        Category::validate_table().expect("category routing table is inconsistent");

        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let settings = Arc::new(
            SettingsCache::load(store.clone())
                .await
                .expect("failed to load settings"),
        );
        let scheduler = Arc::new(Scheduler::new(
            store.clone(),
            settings.clone(),
            config.scheduler_config(),
        ));
        let rollover = Arc::new(RolloverTimer::new(
            scheduler.clone(),
            config.rollover_delay(),
            shutdown,
        ));

        Self {
            config: config.clone(),
            store,
            scheduler,
            settings,
            rollover,
        }
    }
}
