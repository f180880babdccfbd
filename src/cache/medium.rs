//! Storage media behind the cache store.
//!
//! A medium holds snapshots of the cache outside process memory so entries
//! survive restarts. Implementations may fail freely: the store swallows
//! every medium error and degrades to a cold cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One persisted cache entry. At most one live entry exists per
/// `(scope_key, data_key)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub scope_key: String,
    pub data_key: String,
    pub payload: serde_json::Value,
    pub stored_at: DateTime<Utc>,
}

/// Where cache snapshots live between runs.
#[async_trait]
pub trait CacheMedium: Send + Sync {
    async fn load(&self) -> anyhow::Result<Vec<PersistedEntry>>;
    async fn persist(&self, entries: Vec<PersistedEntry>) -> anyhow::Result<()>;
}

/// JSON-file snapshots.
pub struct FileMedium {
    path: PathBuf,
}

impl FileMedium {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CacheMedium for FileMedium {
    async fn load(&self) -> anyhow::Result<Vec<PersistedEntry>> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn persist(&self, entries: Vec<PersistedEntry>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(&entries)?;
        // Write-then-rename so a crash mid-write never truncates the snapshot.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Keeps nothing. Used in tests and when no cache path is configured.
#[derive(Debug, Default)]
pub struct MemoryMedium;

#[async_trait]
impl CacheMedium for MemoryMedium {
    async fn load(&self) -> anyhow::Result<Vec<PersistedEntry>> {
        Ok(Vec::new())
    }

    async fn persist(&self, _entries: Vec<PersistedEntry>) -> anyhow::Result<()> {
        Ok(())
    }
}
