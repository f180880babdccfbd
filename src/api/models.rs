//! Wire types for the school-admin backend, plus the core domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of remotely-synced item an entity is.
///
/// Identity is `(kind, id)`: the same id string may appear under different
/// kinds without colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Course,
    Event,
    Page,
    Token,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Course => "course",
            EntityKind::Event => "event",
            EntityKind::Page => "page",
            EntityKind::Token => "token",
        }
    }

    /// Backend sync endpoint segment for this kind, if it can be synced on
    /// demand. Drive tokens are produced by the OAuth flow; there is no
    /// sync endpoint for them.
    pub fn sync_segment(&self) -> Option<&'static str> {
        match self {
            EntityKind::Course => Some("classroom"),
            EntityKind::Event => Some("calendar"),
            EntityKind::Page => Some("website"),
            EntityKind::Token => None,
        }
    }

    /// The cached dataset a successful sync of this kind invalidates.
    pub fn data_kind(&self) -> Option<DataKind> {
        match self {
            EntityKind::Course => Some(DataKind::Classroom),
            EntityKind::Event => Some(DataKind::Calendar),
            EntityKind::Page => Some(DataKind::Website),
            EntityKind::Token => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dashboard dataset the backend can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Classroom,
    Calendar,
    Website,
}

impl DataKind {
    /// Also the cache data key for this dataset.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Classroom => "classroom",
            DataKind::Calendar => "calendar",
            DataKind::Website => "website",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service participating in grade-wide bulk syncs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ServiceName {
    Classroom,
    Calendar,
}

impl ServiceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Classroom => "classroom",
            ServiceName::Calendar => "calendar",
        }
    }

    /// The cached dataset this service's sync invalidates.
    pub fn data_kind(&self) -> DataKind {
        match self {
            ServiceName::Classroom => DataKind::Classroom,
            ServiceName::Calendar => DataKind::Calendar,
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remotely-synced item surfaced on the dashboard.
///
/// `last_synced` only moves forward on a confirmed sync from the backend;
/// it is never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncableEntity {
    pub id: String,
    pub kind: EntityKind,
    pub last_synced: Option<DateTime<Utc>>,
}

/// One Classroom course as the backend reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub last_synced: Option<DateTime<Utc>>,
}

impl From<CourseEntry> for SyncableEntity {
    fn from(entry: CourseEntry) -> Self {
        Self {
            id: entry.id,
            kind: EntityKind::Course,
            last_synced: entry.last_synced,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomData {
    pub courses: Vec<CourseEntry>,
}

/// One Calendar event as the backend reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEntry {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub last_synced: Option<DateTime<Utc>>,
}

impl From<EventEntry> for SyncableEntity {
    fn from(entry: EventEntry) -> Self {
        Self {
            id: entry.id,
            kind: EntityKind::Event,
            last_synced: entry.last_synced,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarData {
    pub events: Vec<EventEntry>,
}

/// Crawl status for the public school website.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteStatus {
    pub title: String,
    pub crawled_at: Option<DateTime<Utc>>,
}

/// Confirmation body for a single-entity sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncMessage {
    pub message: String,
}

/// Counts returned by a grade-wide sync for one service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GradeSyncCounts {
    pub synced: u32,
    pub failed: u32,
}

/// Background-scheduler status from `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerHealth {
    pub scheduler: String,
    pub next_sync: Option<DateTime<Utc>>,
}

/// Error payload shape the backend uses on failures. Some endpoints report
/// under `error`, others under `detail`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

impl ErrorBody {
    pub(crate) fn message(self) -> Option<String> {
        self.error.or(self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_entry_parses_null_last_synced() {
        let entry: CourseEntry =
            serde_json::from_str(r#"{"id": "c-101", "name": "Maths", "last_synced": null}"#)
                .unwrap();
        assert_eq!(entry.id, "c-101");
        assert!(entry.last_synced.is_none());

        let entity = SyncableEntity::from(entry);
        assert_eq!(entity.kind, EntityKind::Course);
    }

    #[test]
    fn course_entry_parses_iso_timestamp() {
        let entry: CourseEntry =
            serde_json::from_str(r#"{"id": "c-102", "last_synced": "2026-08-30T07:15:00Z"}"#)
                .unwrap();
        assert!(entry.last_synced.is_some());
        assert!(entry.name.is_none());
    }

    #[test]
    fn error_body_prefers_error_over_detail() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "quota exceeded", "detail": "other"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("quota exceeded"));

        let body: ErrorBody = serde_json::from_str(r#"{"detail": "not found"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("not found"));

        let body: ErrorBody = serde_json::from_str(r#"{}"#).unwrap();
        assert!(body.message().is_none());
    }

    #[test]
    fn token_kind_has_no_sync_endpoint() {
        assert!(EntityKind::Token.sync_segment().is_none());
        assert!(EntityKind::Token.data_kind().is_none());
        assert_eq!(EntityKind::Page.sync_segment(), Some("website"));
    }
}
