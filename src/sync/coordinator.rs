//! Orchestration of one-shot and grade-wide sync operations.
//!
//! Every operation claims an in-flight key before dispatch, so a
//! double-clicked dashboard button never issues the same request twice.
//! Grade syncs run their services strictly in sequence: Classroom and
//! Calendar syncs for the same grade draw on the same upstream OAuth quota,
//! and overlapping them invites rate limiting.

use crate::api::SyncBackend;
use crate::api::errors::ApiError;
use crate::api::models::{DataKind, EntityKind, ServiceName};
use crate::cache::CacheStore;
use crate::sync::inflight::InFlightTracker;
use crate::sync::report::{SyncReport, SyncResult, aggregate};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_secs(5);

fn warn_if_slow(start: Instant, operation: &'static str) {
    let elapsed = start.elapsed();
    if elapsed > SLOW_REQUEST_THRESHOLD {
        warn!(operation, elapsed = ?elapsed, "backend request ran long");
    }
}

/// Outcome of a single-entity sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Backend confirmed the sync; affected cache entries were invalidated
    /// and repopulated.
    Completed(String),
    /// An identical operation is already in flight; nothing was dispatched.
    AlreadyRunning,
    /// The coordinator was torn down while the request was outstanding;
    /// the late confirmation was discarded without touching state.
    Cancelled,
    /// This entity kind has no on-demand sync (Drive tokens come from the
    /// OAuth flow).
    Unsupported,
}

/// Outcome of a grade-wide multi-service sync.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupSyncOutcome {
    Report(SyncReport),
    AlreadyRunning,
    Cancelled,
}

/// Coordinates fetches and syncs against the remote backend for one admin
/// scope. Clone-cheap; clones share cache, tracker, and cancellation state.
#[derive(Clone)]
pub struct SyncCoordinator {
    backend: Arc<dyn SyncBackend>,
    cache: CacheStore,
    in_flight: InFlightTracker,
    scope: String,
    cancel: CancellationToken,
}

impl SyncCoordinator {
    pub fn new(
        backend: Arc<dyn SyncBackend>,
        cache: CacheStore,
        in_flight: InFlightTracker,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            cache,
            in_flight,
            scope: scope.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// The admin identity this coordinator caches under.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn in_flight(&self) -> &InFlightTracker {
        &self.in_flight
    }

    /// Tear down the coordinator. Outstanding requests run to completion
    /// (there is no abort path once dispatched) but their results are
    /// discarded instead of mutating cache or report state.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cached read of one dashboard dataset. Hit → no network. Miss →
    /// fetch, populate, return. A fetch error propagates and leaves the
    /// cache untouched.
    ///
    /// Concurrent misses for the same dataset coalesce on a
    /// `"fetch-<kind>"` key: one caller dispatches, the rest park until it
    /// finishes and read its cached result.
    pub async fn fetch_with_cache(&self, kind: DataKind) -> Result<Value, ApiError> {
        let data_key = kind.as_str();
        if let Some(payload) = self.cache.get(data_key, &self.scope) {
            debug!(data_key, scope = %self.scope, "cache hit");
            return Ok(payload);
        }

        let key = format!("fetch-{kind}");
        let Some(_guard) = self.in_flight.begin(&key) else {
            debug!(key = %key, "fetch already in flight, awaiting its result");
            self.in_flight.wait(&key).await;
            if let Some(payload) = self.cache.get(data_key, &self.scope) {
                return Ok(payload);
            }
            // The earlier fetch failed or its result was discarded; dispatch
            // without a claim rather than racing the other losers for one.
            return self.fetch_and_store(kind).await;
        };

        self.fetch_and_store(kind).await
    }

    async fn fetch_and_store(&self, kind: DataKind) -> Result<Value, ApiError> {
        let start = Instant::now();
        let payload = self.backend.fetch_data(kind, &self.scope).await?;
        warn_if_slow(start, "fetch_data");

        if self.cancel.is_cancelled() {
            // Late response for a torn-down view: hand it back, don't cache it.
            return Ok(payload);
        }
        self.cache
            .set(kind.as_str(), payload.clone(), &self.scope)
            .await;
        Ok(payload)
    }

    /// Drop the cached copy of one dataset and refetch it (the dashboards'
    /// manual refresh button).
    pub async fn refresh(&self, kind: DataKind) -> Result<Value, ApiError> {
        self.cache.clear(kind.as_str(), &self.scope).await;
        self.fetch_with_cache(kind).await
    }

    /// One-shot sync for a single entity, guarded on `"<kind>-<id>"`.
    ///
    /// On success the affected dataset is invalidated and refetched so the
    /// next render sees current data. On failure the error propagates and
    /// the cache is left intact; stale data beats no data.
    pub async fn sync_entity(&self, kind: EntityKind, id: &str) -> Result<SyncOutcome, ApiError> {
        if kind.sync_segment().is_none() {
            return Ok(SyncOutcome::Unsupported);
        }

        let key = format!("{kind}-{id}");
        let Some(_guard) = self.in_flight.begin(&key) else {
            debug!(key = %key, "sync already in flight, skipping");
            return Ok(SyncOutcome::AlreadyRunning);
        };

        let start = Instant::now();
        // An error here propagates; the guard drop still releases the key.
        let confirmation = self.backend.sync_entity(kind, id).await?;
        warn_if_slow(start, "sync_entity");

        if self.cancel.is_cancelled() {
            debug!(key = %key, "coordinator torn down, discarding sync confirmation");
            return Ok(SyncOutcome::Cancelled);
        }

        if let Some(data) = kind.data_kind() {
            self.cache.clear(data.as_str(), &self.scope).await;
            // Repopulate eagerly. A failure here is not a sync failure:
            // the sync itself already succeeded and the cleared entry just
            // means the next read goes to the network.
            match self.backend.fetch_data(data, &self.scope).await {
                Ok(payload) => {
                    if !self.cancel.is_cancelled() {
                        self.cache.set(data.as_str(), payload, &self.scope).await;
                    }
                }
                Err(e) => warn!(key = %key, error = %e, "refetch after sync failed"),
            }
        }

        info!(key = %key, message = %confirmation.message, "entity sync completed");
        Ok(SyncOutcome::Completed(confirmation.message))
    }

    /// Grade-wide sync across services, guarded on `"<group_id>-all"`.
    ///
    /// Services run strictly in sequence; each outcome is recorded as data.
    /// One service failing never skips the next and never escapes as an
    /// error; the report carries the failure instead.
    pub async fn sync_group(&self, group_id: &str, services: &[ServiceName]) -> GroupSyncOutcome {
        let key = format!("{group_id}-all");
        let Some(_guard) = self.in_flight.begin(&key) else {
            debug!(key = %key, "group sync already in flight, skipping");
            return GroupSyncOutcome::AlreadyRunning;
        };

        let mut results: BTreeMap<ServiceName, SyncResult> = BTreeMap::new();
        for &service in services {
            if self.cancel.is_cancelled() {
                debug!(key = %key, "coordinator torn down mid-group, discarding partial results");
                return GroupSyncOutcome::Cancelled;
            }

            let start = Instant::now();
            let result = match self
                .backend
                .sync_grade_service(group_id, service, &self.scope)
                .await
            {
                Ok(counts) => {
                    debug!(key = %key, service = %service, synced = counts.synced, failed = counts.failed, "service sync finished");
                    SyncResult::from(counts)
                }
                Err(e) => {
                    warn!(key = %key, service = %service, error = %e, "service sync failed");
                    SyncResult::failure(e.to_string())
                }
            };
            warn_if_slow(start, "sync_grade_service");
            results.insert(service, result);
        }

        if self.cancel.is_cancelled() {
            return GroupSyncOutcome::Cancelled;
        }

        // Force fresh reads for every dataset a service may have changed.
        for &service in services {
            self.cache
                .clear(service.data_kind().as_str(), &self.scope)
                .await;
        }

        let report = aggregate(results);
        info!(
            key = %key,
            total_synced = report.total_synced,
            total_failed = report.total_failed,
            "group sync completed"
        );
        GroupSyncOutcome::Report(report)
    }
}
