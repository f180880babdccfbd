//! Coordinator behavior under partial failure, duplicate triggers, and
//! teardown, driven through a scripted in-memory backend.

use async_trait::async_trait;
use classdesk::api::SyncBackend;
use classdesk::api::errors::ApiError;
use classdesk::api::models::{
    DataKind, EntityKind, GradeSyncCounts, SchedulerHealth, ServiceName, SyncMessage,
};
use classdesk::cache::{CacheStore, MemoryMedium};
use classdesk::sync::inflight::InFlightTracker;
use classdesk::sync::{GroupSyncOutcome, SyncCoordinator, SyncOutcome};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

const SCOPE: &str = "head@school.example";

/// Scripted backend: records every call in order, optionally fails chosen
/// services, and optionally blocks behind a gate so tests can observe
/// operations while they are in flight.
#[derive(Default)]
struct MockBackend {
    calls: Mutex<Vec<String>>,
    fail_services: Vec<ServiceName>,
    fail_entity_sync: bool,
    gate: Option<Arc<Notify>>,
}

impl MockBackend {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncBackend for MockBackend {
    async fn fetch_data(&self, kind: DataKind, _scope: &str) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(format!("fetch-{kind}"));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(json!({ "courses": [{ "id": "c-1", "last_synced": "2026-08-30T08:00:00Z" }] }))
    }

    async fn sync_entity(&self, kind: EntityKind, id: &str) -> Result<SyncMessage, ApiError> {
        self.calls.lock().unwrap().push(format!("sync-{kind}-{id}"));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_entity_sync {
            return Err(ApiError::Upstream {
                status: 502,
                message: "classroom API unavailable".into(),
            });
        }
        Ok(SyncMessage {
            message: format!("{kind} synced"),
        })
    }

    async fn sync_grade_service(
        &self,
        grade: &str,
        service: ServiceName,
        _email: &str,
    ) -> Result<GradeSyncCounts, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("grade-{grade}-{service}"));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_services.contains(&service) {
            return Err(ApiError::Upstream {
                status: 429,
                message: "quota exceeded".into(),
            });
        }
        Ok(GradeSyncCounts {
            synced: 4,
            failed: 0,
        })
    }

    async fn health(&self) -> Result<SchedulerHealth, ApiError> {
        Ok(SchedulerHealth {
            scheduler: "running".into(),
            next_sync: None,
        })
    }
}

fn coordinator_with(backend: Arc<MockBackend>) -> (SyncCoordinator, CacheStore) {
    let cache = CacheStore::new(Arc::new(MemoryMedium), None);
    let coordinator = SyncCoordinator::new(
        backend as Arc<dyn SyncBackend>,
        cache.clone(),
        InFlightTracker::new(),
        SCOPE,
    );
    (coordinator, cache)
}

#[tokio::test]
async fn classroom_failure_does_not_skip_calendar() {
    let backend = Arc::new(MockBackend {
        fail_services: vec![ServiceName::Classroom],
        ..Default::default()
    });
    let (coordinator, _cache) = coordinator_with(Arc::clone(&backend));

    let outcome = coordinator
        .sync_group("Grade 5", &[ServiceName::Classroom, ServiceName::Calendar])
        .await;

    let GroupSyncOutcome::Report(report) = outcome else {
        panic!("expected a report, got {outcome:?}");
    };

    let classroom = &report.per_service[&ServiceName::Classroom];
    assert_eq!(classroom.synced, 0);
    assert_eq!(classroom.failed, 1);
    assert!(classroom.error.as_deref().unwrap().contains("quota exceeded"));

    let calendar = &report.per_service[&ServiceName::Calendar];
    assert_eq!(calendar.synced, 4);
    assert!(calendar.error.is_none());

    assert_eq!(report.total_synced, 4);
    assert_eq!(report.total_failed, 1);

    // The calendar request was still attempted, after classroom resolved.
    assert_eq!(
        backend.calls(),
        vec!["grade-Grade 5-classroom", "grade-Grade 5-calendar"]
    );
}

#[tokio::test]
async fn duplicate_group_trigger_is_refused_while_in_flight() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(MockBackend {
        gate: Some(Arc::clone(&gate)),
        ..Default::default()
    });
    let (coordinator, _cache) = coordinator_with(Arc::clone(&backend));

    let first = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .sync_group("Grade 3", &[ServiceName::Classroom])
                .await
        })
    };
    // Let the first sync claim its key and block on the gate.
    tokio::task::yield_now().await;

    let second = coordinator
        .sync_group("Grade 3", &[ServiceName::Classroom])
        .await;
    assert_eq!(second, GroupSyncOutcome::AlreadyRunning);

    gate.notify_one();
    let first = first.await.unwrap();
    assert!(matches!(first, GroupSyncOutcome::Report(_)));

    // Key released after completion: a new trigger dispatches again.
    gate.notify_one();
    let third = coordinator
        .sync_group("Grade 3", &[ServiceName::Classroom])
        .await;
    assert!(matches!(third, GroupSyncOutcome::Report(_)));
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn entity_sync_invalidates_and_repopulates_cache() {
    let backend = Arc::new(MockBackend::default());
    let (coordinator, cache) = coordinator_with(Arc::clone(&backend));

    cache.set("classroom", json!({ "stale": true }), SCOPE).await;

    let outcome = coordinator
        .sync_entity(EntityKind::Course, "head@school.example")
        .await
        .unwrap();
    assert_eq!(outcome, SyncOutcome::Completed("course synced".into()));

    // The stale payload was replaced with the freshly fetched one.
    let cached = cache.get("classroom", SCOPE).unwrap();
    assert!(cached.get("courses").is_some());

    assert_eq!(
        backend.calls(),
        vec!["sync-course-head@school.example", "fetch-classroom"]
    );
}

#[tokio::test]
async fn entity_sync_failure_leaves_cache_intact_and_releases_key() {
    let backend = Arc::new(MockBackend {
        fail_entity_sync: true,
        ..Default::default()
    });
    let (coordinator, cache) = coordinator_with(backend);

    cache.set("classroom", json!({ "stale": true }), SCOPE).await;

    let err = coordinator
        .sync_entity(EntityKind::Course, "head@school.example")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("classroom API unavailable"));

    // Stale data beats no data.
    assert_eq!(cache.get("classroom", SCOPE), Some(json!({ "stale": true })));
    // The in-flight key did not get stuck.
    assert!(
        !coordinator
            .in_flight()
            .contains("course-head@school.example")
    );
}

#[tokio::test]
async fn cancelled_coordinator_discards_group_results() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(MockBackend {
        gate: Some(Arc::clone(&gate)),
        ..Default::default()
    });
    let (coordinator, cache) = coordinator_with(backend);
    cache.set("classroom", json!({ "stale": true }), SCOPE).await;

    let handle = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .sync_group("Grade 2", &[ServiceName::Classroom, ServiceName::Calendar])
                .await
        })
    };
    tokio::task::yield_now().await;

    // Teardown while the first service call is outstanding.
    coordinator.cancel();
    gate.notify_one();
    gate.notify_one();

    let outcome = handle.await.unwrap();
    assert_eq!(outcome, GroupSyncOutcome::Cancelled);
    // A defunct view's cache is left alone.
    assert_eq!(cache.get("classroom", SCOPE), Some(json!({ "stale": true })));
}

#[tokio::test]
async fn token_entities_are_not_dispatched() {
    let backend = Arc::new(MockBackend::default());
    let (coordinator, _cache) = coordinator_with(Arc::clone(&backend));

    let outcome = coordinator
        .sync_entity(EntityKind::Token, "drive-token-1")
        .await
        .unwrap();
    assert_eq!(outcome, SyncOutcome::Unsupported);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn fetch_with_cache_only_hits_the_backend_once() {
    let backend = Arc::new(MockBackend::default());
    let (coordinator, _cache) = coordinator_with(Arc::clone(&backend));

    let first = coordinator.fetch_with_cache(DataKind::Classroom).await.unwrap();
    let second = coordinator.fetch_with_cache(DataKind::Classroom).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.calls(), vec!["fetch-classroom"]);
}

#[tokio::test]
async fn concurrent_misses_for_one_dataset_coalesce() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(MockBackend {
        gate: Some(Arc::clone(&gate)),
        ..Default::default()
    });
    let (coordinator, _cache) = coordinator_with(Arc::clone(&backend));

    let first = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.fetch_with_cache(DataKind::Classroom).await })
    };
    // Let the first fetch claim its key and block on the gate.
    tokio::task::yield_now().await;
    assert!(coordinator.in_flight().contains("fetch-classroom"));

    let second = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.fetch_with_cache(DataKind::Classroom).await })
    };
    tokio::task::yield_now().await;

    gate.notify_one();
    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first, second);

    // One network round trip served both callers.
    assert_eq!(backend.calls(), vec!["fetch-classroom"]);
}

#[tokio::test]
async fn refresh_forces_a_refetch() {
    let backend = Arc::new(MockBackend::default());
    let (coordinator, _cache) = coordinator_with(Arc::clone(&backend));

    coordinator.fetch_with_cache(DataKind::Classroom).await.unwrap();
    coordinator.refresh(DataKind::Classroom).await.unwrap();

    assert_eq!(backend.calls(), vec!["fetch-classroom", "fetch-classroom"]);
}
