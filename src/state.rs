//! Application state wiring the coordination core together.

use crate::api::{AdminApi, SyncBackend};
use crate::cache::{ANONYMOUS_SCOPE, CacheMedium, CacheStore, FileMedium, MemoryMedium};
use crate::config::Config;
use crate::sync::SyncCoordinator;
use crate::sync::inflight::InFlightTracker;
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Shared state behind every command: the backend client, the scoped
/// cache, the in-flight set, and the coordinator that ties them together.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<AdminApi>,
    pub cache: CacheStore,
    pub in_flight: InFlightTracker,
    pub coordinator: SyncCoordinator,
}

impl AppState {
    /// Wire up the core from configuration. Cache snapshots go to a JSON
    /// file when a path is configured; otherwise nothing persists.
    pub async fn new(config: &Config) -> Result<Self> {
        let api = Arc::new(AdminApi::new(config)?);

        let medium: Arc<dyn CacheMedium> = match &config.cache_path {
            Some(path) => Arc::new(FileMedium::new(path)),
            None => Arc::new(MemoryMedium),
        };
        let ttl = config
            .cache_ttl_secs
            .map(|secs| chrono::Duration::seconds(secs as i64));
        let cache = CacheStore::new(medium, ttl);
        cache.load().await;

        let in_flight = InFlightTracker::new();
        let scope = config
            .admin_email
            .clone()
            .unwrap_or_else(|| ANONYMOUS_SCOPE.to_owned());
        debug!(scope = %scope, "coordinator scope resolved");

        let coordinator = SyncCoordinator::new(
            Arc::clone(&api) as Arc<dyn SyncBackend>,
            cache.clone(),
            in_flight.clone(),
            scope,
        );

        Ok(Self {
            api,
            cache,
            in_flight,
            coordinator,
        })
    }

    /// Logout teardown: discard results of anything still in flight and
    /// wipe the admin's cache namespace so the next identity starts clean.
    pub async fn logout(&self) {
        self.coordinator.cancel();
        self.cache.clear_scope(self.coordinator.scope()).await;
    }
}
