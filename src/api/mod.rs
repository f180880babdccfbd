//! HTTP client for the school-admin sync backend.
//!
//! The backend (Classroom/Calendar integration, crawler, OAuth exchange) is
//! a black box behind [`SyncBackend`]; this module only knows its HTTP
//! shape. Tests substitute their own implementation of the trait.

pub mod errors;
pub mod json;
pub mod models;

use crate::api::errors::ApiError;
use crate::api::models::{
    CalendarData, ClassroomData, DataKind, EntityKind, ErrorBody, GradeSyncCounts,
    SchedulerHealth, ServiceName, SyncMessage, WebsiteStatus,
};
use crate::config::Config;
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Seam between the coordinator and the remote backend.
#[async_trait]
pub trait SyncBackend: Send + Sync {
    /// Fetch the current dataset of one kind, scoped to an admin identity.
    async fn fetch_data(&self, kind: DataKind, scope: &str) -> Result<Value, ApiError>;

    /// Trigger a one-shot sync for a single entity. The id is the admin
    /// email for classroom/calendar entities, or the page URL for pages.
    async fn sync_entity(&self, kind: EntityKind, id: &str) -> Result<SyncMessage, ApiError>;

    /// Trigger a grade-wide sync for one service.
    async fn sync_grade_service(
        &self,
        grade: &str,
        service: ServiceName,
        email: &str,
    ) -> Result<GradeSyncCounts, ApiError>;

    /// Read-only background-scheduler status.
    async fn health(&self) -> Result<SchedulerHealth, ApiError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncRequest<'a> {
    admin_email: &'a str,
}

#[derive(Serialize)]
struct GradeSyncRequest<'a> {
    service: ServiceName,
    email: &'a str,
}

/// Production [`SyncBackend`] over reqwest.
pub struct AdminApi {
    client: reqwest::Client,
    base_url: String,
    site_url: Option<String>,
}

impl AdminApi {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("classdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            site_url: config.site_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Read a response body, normalizing the three failure shapes:
    /// transport errors, non-2xx statuses, and unparseable 2xx bodies.
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_owned()
                });
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        json::parse_json_with_path(&body).map_err(|source| ApiError::Malformed { url, source })
    }

    /// GET a typed dataset and hand it back as a cacheable JSON value.
    /// Parsing into `T` first validates the shape at the boundary.
    async fn get_dataset<T: DeserializeOwned + Serialize>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let response = self.client.get(&url).query(query).send().await?;
        let data: T = Self::read_json(response).await?;
        serde_json::to_value(&data).map_err(|e| ApiError::Malformed {
            url,
            source: e.into(),
        })
    }
}

#[async_trait]
impl SyncBackend for AdminApi {
    async fn fetch_data(&self, kind: DataKind, scope: &str) -> Result<Value, ApiError> {
        match kind {
            DataKind::Classroom => {
                let url = self.endpoint("/api/admin/data/classroom");
                self.get_dataset::<ClassroomData>(url, &[("email", scope)])
                    .await
            }
            DataKind::Calendar => {
                let url = self.endpoint("/api/admin/data/calendar");
                self.get_dataset::<CalendarData>(url, &[("email", scope)])
                    .await
            }
            DataKind::Website => {
                // An unconfigured site URL yields an empty `url=` param,
                // which the backend rejects like any other unknown page.
                let site = self.site_url.as_deref().unwrap_or_default();
                let url = self.endpoint("/api/admin/data/website");
                self.get_dataset::<WebsiteStatus>(url, &[("url", site)])
                    .await
            }
        }
    }

    async fn sync_entity(&self, kind: EntityKind, id: &str) -> Result<SyncMessage, ApiError> {
        let Some(segment) = kind.sync_segment() else {
            return Err(ApiError::Upstream {
                status: 400,
                message: format!("{kind} entities have no sync endpoint"),
            });
        };
        let url = self.endpoint(&format!("/api/admin/sync/{segment}"));
        let response = self
            .client
            .post(&url)
            .json(&SyncRequest { admin_email: id })
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn sync_grade_service(
        &self,
        grade: &str,
        service: ServiceName,
        email: &str,
    ) -> Result<GradeSyncCounts, ApiError> {
        let url = self.endpoint(&format!("/api/admin/sync/grade/{grade}"));
        let response = self
            .client
            .post(&url)
            .json(&GradeSyncRequest { service, email })
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn health(&self) -> Result<SchedulerHealth, ApiError> {
        let url = self.endpoint("/health");
        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }
}
