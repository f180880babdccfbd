//! Aggregation of multi-service sync outcomes into a single report.

use crate::api::models::{GradeSyncCounts, ServiceName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of one service's sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub synced: u32,
    pub failed: u32,
    pub error: Option<String>,
}

impl SyncResult {
    /// A failed attempt normalized to data: nothing synced, one failure,
    /// and the human-readable cause.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            synced: 0,
            failed: 1,
            error: Some(message.into()),
        }
    }
}

impl From<GradeSyncCounts> for SyncResult {
    fn from(counts: GradeSyncCounts) -> Self {
        Self {
            synced: counts.synced,
            failed: counts.failed,
            error: None,
        }
    }
}

/// Combined report for one group sync across services.
///
/// Serializes for the machine-checkable report; `Display` renders the
/// admin-facing summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub per_service: BTreeMap<ServiceName, SyncResult>,
    pub total_synced: u32,
    pub total_failed: u32,
}

/// Sum per-service counts into a report, keeping every service's entry
/// (including its error text) intact for display.
pub fn aggregate(results: BTreeMap<ServiceName, SyncResult>) -> SyncReport {
    let total_synced = results.values().map(|r| r.synced).sum();
    let total_failed = results.values().map(|r| r.failed).sum();
    SyncReport {
        per_service: results,
        total_synced,
        total_failed,
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (service, result) in &self.per_service {
            match &result.error {
                Some(error) => writeln!(
                    f,
                    "{service}: {} synced, {} failed ({error})",
                    result.synced, result.failed
                )?,
                None => writeln!(
                    f,
                    "{service}: {} synced, {} failed",
                    result.synced, result.failed
                )?,
            }
        }
        writeln!(
            f,
            "total: {} synced, {} failed",
            self.total_synced, self.total_failed
        )
    }
}
