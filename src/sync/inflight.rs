//! De-duplication of concurrent sync and fetch operations.
//!
//! A key is present iff a request for that operation is currently
//! outstanding. Release happens on guard `Drop`, so early returns, `?`
//! propagation, and panics all take the same cleanup path. A failed
//! operation must never leave its key stuck, or the matching dashboard
//! control would stay disabled forever.
//!
//! Each key carries a [`Notify`] so refused callers can park on
//! [`InFlightTracker::wait`] and resume the moment the holder releases,
//! instead of polling or dispatching a duplicate request.
//!
//! The tracker is process-wide and not scoped by admin identity: two admins
//! syncing the same entity concurrently would collide on the key. Accepted
//! for a single-admin-at-a-time tool.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::trace;

#[derive(Clone, Default)]
pub struct InFlightTracker {
    keys: Arc<DashMap<String, Arc<Notify>>>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a key. Returns `None` when an identical operation is already
    /// in flight, in which case the caller must not dispatch a duplicate.
    pub fn begin(&self, key: &str) -> Option<InFlightGuard> {
        match self.keys.entry(key.to_owned()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Notify::new()));
                trace!(key, "operation marked in flight");
                Some(InFlightGuard {
                    keys: Arc::clone(&self.keys),
                    key: key.to_owned(),
                })
            }
        }
    }

    /// Park until no operation holds this key. Returns immediately when the
    /// key is idle.
    pub async fn wait(&self, key: &str) {
        loop {
            let Some(done) = self.keys.get(key).map(|entry| Arc::clone(entry.value())) else {
                return;
            };
            let notified = done.notified();
            tokio::pin!(notified);
            // Register before the re-check so a release between the two
            // cannot be missed.
            notified.as_mut().enable();
            if !self.keys.contains_key(key) {
                return;
            }
            notified.await;
        }
    }

    /// Whether an operation for this key is currently outstanding.
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Snapshot of all in-flight keys, for busy-state display.
    pub fn active(&self) -> Vec<String> {
        self.keys.iter().map(|entry| entry.key().clone()).collect()
    }
}

/// Releases its key when dropped, whatever path the operation took.
pub struct InFlightGuard {
    keys: Arc<DashMap<String, Arc<Notify>>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some((_, done)) = self.keys.remove(&self.key) {
            done.notify_waiters();
        }
        trace!(key = %self.key, "operation released");
    }
}
