//! Scoped response cache for admin dashboard data.
//!
//! The cache exists to avoid duplicate fetches within a session, nothing
//! more. Staleness display is the freshness classifier's concern, so no TTL
//! applies unless one is configured explicitly. Entries are namespaced by
//! scope key (admin identity, or the anonymous sentinel before login) so
//! pre-login and post-login data never collide.
//!
//! Every failure of the backing medium is swallowed and logged at debug
//! level; a broken cache degrades to a miss, never an error.

pub mod medium;

pub use medium::{CacheMedium, FileMedium, MemoryMedium, PersistedEntry};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Scope key used before any admin identity is known.
pub const ANONYMOUS_SCOPE: &str = "";

#[derive(Debug, Clone)]
struct StoredEntry {
    payload: Value,
    stored_at: DateTime<Utc>,
}

/// Per-scope key/value store with write-through persistence.
#[derive(Clone)]
pub struct CacheStore {
    /// (scope_key, data_key) → entry
    entries: Arc<DashMap<(String, String), StoredEntry>>,
    medium: Arc<dyn CacheMedium>,
    ttl: Option<Duration>,
}

impl CacheStore {
    pub fn new(medium: Arc<dyn CacheMedium>, ttl: Option<Duration>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            medium,
            ttl,
        }
    }

    /// Populate from the medium. Call once at startup; failures leave the
    /// cache cold.
    pub async fn load(&self) {
        match self.medium.load().await {
            Ok(persisted) => {
                let count = persisted.len();
                for entry in persisted {
                    self.entries.insert(
                        (entry.scope_key, entry.data_key),
                        StoredEntry {
                            payload: entry.payload,
                            stored_at: entry.stored_at,
                        },
                    );
                }
                debug!(entries = count, "cache loaded from medium");
            }
            Err(e) => debug!(error = %e, "cache medium unreadable, starting cold"),
        }
    }

    /// Return the live entry for `(scope, data_key)`, or `None` on a miss
    /// or when the entry has outlived a configured TTL.
    pub fn get(&self, data_key: &str, scope: &str) -> Option<Value> {
        let entry = self
            .entries
            .get(&(scope.to_owned(), data_key.to_owned()))?;
        if let Some(ttl) = self.ttl
            && Utc::now() - entry.stored_at >= ttl
        {
            return None;
        }
        Some(entry.payload.clone())
    }

    /// Store a payload, replacing any live entry for the same pair.
    pub async fn set(&self, data_key: &str, payload: Value, scope: &str) {
        self.entries.insert(
            (scope.to_owned(), data_key.to_owned()),
            StoredEntry {
                payload,
                stored_at: Utc::now(),
            },
        );
        self.persist().await;
    }

    /// Remove one entry so the next fetch is forced.
    pub async fn clear(&self, data_key: &str, scope: &str) {
        self.entries
            .remove(&(scope.to_owned(), data_key.to_owned()));
        self.persist().await;
    }

    /// Remove every entry under a scope. Used on logout, when the admin
    /// identity the entries were keyed by stops being valid.
    pub async fn clear_scope(&self, scope: &str) {
        self.entries.retain(|key, _| key.0 != scope);
        self.persist().await;
    }

    /// Snapshot the current entries into the medium. Errors are swallowed;
    /// persistence is an optimization, never a correctness dependency.
    async fn persist(&self) {
        let snapshot: Vec<PersistedEntry> = self
            .entries
            .iter()
            .map(|entry| {
                let (scope_key, data_key) = entry.key().clone();
                PersistedEntry {
                    scope_key,
                    data_key,
                    payload: entry.value().payload.clone(),
                    stored_at: entry.value().stored_at,
                }
            })
            .collect();
        if let Err(e) = self.medium.persist(snapshot).await {
            debug!(error = %e, "cache medium write failed, continuing without persistence");
        }
    }
}
