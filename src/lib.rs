//! Sync-state and cache coordination core for a school-admin dashboard.
//!
//! The dashboards render entirely from this crate's surface
//! ([`SyncCoordinator::fetch_with_cache`], [`SyncCoordinator::sync_entity`],
//! [`SyncCoordinator::sync_group`], and [`classify`]) and never talk to
//! the backend directly. The remote sync/crawl/OAuth service stays a black
//! box behind the [`api::SyncBackend`] trait.
//!
//! [`SyncCoordinator::fetch_with_cache`]: sync::SyncCoordinator::fetch_with_cache
//! [`SyncCoordinator::sync_entity`]: sync::SyncCoordinator::sync_entity
//! [`SyncCoordinator::sync_group`]: sync::SyncCoordinator::sync_group
//! [`classify`]: sync::classify

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod logging;
pub mod state;
pub mod sync;
