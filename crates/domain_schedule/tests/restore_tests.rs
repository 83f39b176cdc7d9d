//! Restore service tests
//!
//! Runs the diff-and-apply flow against an in-memory store, including
//! the atomic-rollback guarantee when an apply fails partway.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use core_kernel::{DomainPort, FboId, PortError, ScheduleVersionId, UserId};
use domain_schedule::{
    FeeScheduleSnapshot, FeeScheduleVersion, ScheduleConfigService, ScheduleError, ScheduleStore,
    VersionRepository,
};

/// In-memory schedule store applying diffs to a held snapshot; a
/// poison switch makes apply fail without touching state, which is
/// exactly the contract a transactional store provides.
#[derive(Default)]
struct MemoryScheduleStore {
    snapshot: Mutex<FeeScheduleSnapshot>,
    fail_next_apply: AtomicBool,
}

impl MemoryScheduleStore {
    fn with_snapshot(snapshot: FeeScheduleSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            fail_next_apply: AtomicBool::new(false),
        }
    }

    fn poison(&self) {
        self.fail_next_apply.store(true, Ordering::SeqCst);
    }

    fn current(&self) -> FeeScheduleSnapshot {
        self.snapshot.lock().unwrap().clone()
    }
}

impl DomainPort for MemoryScheduleStore {}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn current_snapshot(&self, _fbo: FboId) -> Result<FeeScheduleSnapshot, PortError> {
        Ok(self.current())
    }

    async fn apply_diff(
        &self,
        _fbo: FboId,
        diff: &domain_schedule::ScheduleDiff,
    ) -> Result<(), PortError> {
        if self.fail_next_apply.swap(false, Ordering::SeqCst) {
            return Err(PortError::internal("simulated constraint failure"));
        }

        let mut snapshot = self.snapshot.lock().unwrap();
        for (name, changes) in diff.delete_order() {
            let collection = collection_mut(&mut snapshot, name);
            collection.retain(|record| {
                record
                    .get("id")
                    .map(|id| !changes.delete.contains(id))
                    .unwrap_or(true)
            });
        }
        for (name, changes) in diff.create_order() {
            let collection = collection_mut(&mut snapshot, name);
            for record in &changes.update {
                let id = record.get("id").cloned();
                if let Some(existing) = collection
                    .iter_mut()
                    .find(|r| r.get("id").cloned() == id)
                {
                    *existing = record.clone();
                }
            }
            collection.extend(changes.create.iter().cloned());
        }
        Ok(())
    }
}

fn collection_mut<'a>(
    snapshot: &'a mut FeeScheduleSnapshot,
    name: &str,
) -> &'a mut Vec<serde_json::Value> {
    match name {
        "classifications" => &mut snapshot.classifications,
        "aircraft_types" => &mut snapshot.aircraft_types,
        "fee_rules" => &mut snapshot.fee_rules,
        "overrides" => &mut snapshot.overrides,
        "waiver_tiers" => &mut snapshot.waiver_tiers,
        "aircraft_type_configs" => &mut snapshot.aircraft_type_configs,
        other => panic!("unknown collection {other}"),
    }
}

#[derive(Default)]
struct MemoryVersionRepository {
    versions: Mutex<Vec<FeeScheduleVersion>>,
}

impl DomainPort for MemoryVersionRepository {}

#[async_trait]
impl VersionRepository for MemoryVersionRepository {
    async fn insert(&self, version: &FeeScheduleVersion) -> Result<(), PortError> {
        self.versions.lock().unwrap().push(version.clone());
        Ok(())
    }

    async fn find(
        &self,
        id: ScheduleVersionId,
    ) -> Result<Option<FeeScheduleVersion>, PortError> {
        Ok(self
            .versions
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn list(&self, fbo: FboId) -> Result<Vec<FeeScheduleVersion>, PortError> {
        Ok(self
            .versions
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.fbo_location_id == fbo)
            .cloned()
            .collect())
    }
}

fn initial_snapshot() -> FeeScheduleSnapshot {
    serde_json::from_value(json!({
        "classifications": [{"id": "cls-1", "name": "Light Jet"}],
        "fee_rules": [
            {"id": "fee-1", "fee_code": "RAMP", "amount": 75.0},
            {"id": "fee-2", "fee_code": "GPU", "amount": 50.0}
        ]
    }))
    .unwrap()
}

fn service(
    store: Arc<MemoryScheduleStore>,
    versions: Arc<MemoryVersionRepository>,
) -> ScheduleConfigService {
    ScheduleConfigService::new(store, versions)
}

#[tokio::test]
async fn create_version_captures_the_live_configuration() {
    let store = Arc::new(MemoryScheduleStore::with_snapshot(initial_snapshot()));
    let versions = Arc::new(MemoryVersionRepository::default());
    let service = service(store.clone(), versions.clone());
    let fbo = FboId::new();

    let version = service
        .create_version(fbo, "pre-season", Some("before rate change".to_string()), UserId::new())
        .await
        .unwrap();

    assert_eq!(version.configuration_data, initial_snapshot());
    assert_eq!(service.list_versions(fbo).await.unwrap().len(), 1);
}

#[tokio::test]
async fn restore_reverts_changed_rows_and_reports_counts() {
    let store = Arc::new(MemoryScheduleStore::with_snapshot(initial_snapshot()));
    let versions = Arc::new(MemoryVersionRepository::default());
    let service = service(store.clone(), versions.clone());
    let fbo = FboId::new();

    let version = service
        .create_version(fbo, "baseline", None, UserId::new())
        .await
        .unwrap();

    // Drift: reprice RAMP, drop GPU, add a new fee
    {
        let mut snapshot = store.snapshot.lock().unwrap();
        snapshot.fee_rules = vec![
            json!({"id": "fee-1", "fee_code": "RAMP", "amount": 95.0}),
            json!({"id": "fee-3", "fee_code": "LAV", "amount": 35.0}),
        ];
    }

    let summary = service.restore_from_version(version.id).await.unwrap();

    let fee_counts = summary.collections["fee_rules"];
    assert_eq!(fee_counts.updated, 1);
    assert_eq!(fee_counts.created, 1);
    assert_eq!(fee_counts.deleted, 1);

    let restored = store.current();
    assert_eq!(restored.fee_rules.len(), 2);
    let ramp = restored
        .fee_rules
        .iter()
        .find(|r| r["fee_code"] == json!("RAMP"))
        .unwrap();
    assert_eq!(ramp["amount"], json!(75.0));
    assert!(restored.fee_rules.iter().all(|r| r["fee_code"] != json!("LAV")));
}

#[tokio::test]
async fn restore_is_a_no_op_when_nothing_drifted() {
    let store = Arc::new(MemoryScheduleStore::with_snapshot(initial_snapshot()));
    let versions = Arc::new(MemoryVersionRepository::default());
    let service = service(store.clone(), versions.clone());
    let fbo = FboId::new();

    let version = service.create_version(fbo, "baseline", None, UserId::new()).await.unwrap();
    // A failure here would surface if apply were called
    store.poison();

    let summary = service.restore_from_version(version.id).await.unwrap();
    assert_eq!(summary.total_changes(), 0);
    assert_eq!(store.current(), initial_snapshot());
}

#[tokio::test]
async fn failed_apply_leaves_the_configuration_untouched() {
    let store = Arc::new(MemoryScheduleStore::with_snapshot(initial_snapshot()));
    let versions = Arc::new(MemoryVersionRepository::default());
    let service = service(store.clone(), versions.clone());
    let fbo = FboId::new();

    let version = service.create_version(fbo, "baseline", None, UserId::new()).await.unwrap();

    let drifted = {
        let mut snapshot = store.snapshot.lock().unwrap();
        snapshot.fee_rules[0]["amount"] = json!(95.0);
        snapshot.clone()
    };

    store.poison();
    let result = service.restore_from_version(version.id).await;

    assert!(matches!(result, Err(ScheduleError::Port(_))));
    assert_eq!(store.current(), drifted);
}

#[tokio::test]
async fn restoring_an_unknown_version_is_not_found() {
    let store = Arc::new(MemoryScheduleStore::default());
    let versions = Arc::new(MemoryVersionRepository::default());
    let service = service(store, versions);

    let result = service.restore_from_version(ScheduleVersionId::new()).await;
    assert!(matches!(result, Err(ScheduleError::VersionNotFound(_))));
}
