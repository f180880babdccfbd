//! Runtime configuration, merged from `classdesk.toml` and the environment.

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the school-admin sync backend.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Admin identity used as the cache scope key and in sync request
    /// bodies. Absent means the anonymous (pre-login) scope.
    #[serde(default)]
    pub admin_email: Option<String>,
    /// Public school website root, for crawl-status lookups.
    #[serde(default)]
    pub site_url: Option<String>,
    /// Where cache snapshots persist between runs. Absent disables
    /// persistence entirely.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    /// Optional cache TTL in seconds. Absent means entries never expire;
    /// staleness is surfaced through freshness tiers instead.
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_owned()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Config {
    /// Load from `classdesk.toml` with `CLASSDESK_`-prefixed environment
    /// variables layered on top.
    pub fn load() -> anyhow::Result<Self> {
        Figment::new()
            .merge(Toml::file("classdesk.toml"))
            .merge(Env::prefixed("CLASSDESK_"))
            .extract()
            .context("Failed to load config")
    }
}
