//! Freshness tiers for externally-synced entities.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// Inclusive lower bound of the `Stale` tier, in hours.
const STALE_AFTER_HOURS: i64 = 6;
/// Inclusive lower bound of the `Outdated` tier, in hours.
const OUTDATED_AFTER_HOURS: i64 = 24;

/// How fresh an entity's last confirmed sync is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Fresh,
    Stale,
    Outdated,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::Fresh => "fresh",
            Freshness::Stale => "stale",
            Freshness::Outdated => "outdated",
        }
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a last-synced timestamp against `now`.
///
/// Never-synced entities are `Outdated`. Boundaries are inclusive on the
/// lower bound of each tier: exactly 6 hours old is `Stale`, exactly 24
/// hours old is `Outdated`. A timestamp in the future reads as `Fresh`.
pub fn classify(last_synced: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Freshness {
    let Some(synced_at) = last_synced else {
        return Freshness::Outdated;
    };
    let age = now - synced_at;
    if age < Duration::hours(STALE_AFTER_HOURS) {
        Freshness::Fresh
    } else if age < Duration::hours(OUTDATED_AFTER_HOURS) {
        Freshness::Stale
    } else {
        Freshness::Outdated
    }
}
