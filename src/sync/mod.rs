//! Sync-state coordination: freshness tiers, in-flight guarding,
//! orchestration, and result aggregation.

pub mod coordinator;
pub mod freshness;
pub mod inflight;
pub mod report;

pub use coordinator::{GroupSyncOutcome, SyncCoordinator, SyncOutcome};
pub use freshness::{Freshness, classify};
pub use inflight::{InFlightGuard, InFlightTracker};
pub use report::{SyncReport, SyncResult, aggregate};
