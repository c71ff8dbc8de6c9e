//! Durable update queue and the one-record-at-a-time apply loop.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::catalog::ResourceType;
use crate::error::{ApplyError, StoreError};
use crate::model::FieldValue;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Pending,
    Submitted,
    Failed,
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Submitted => write!(f, "submitted"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Sparse set of target fields to change. Absent = leave alone.
pub type PartialEntity = BTreeMap<String, FieldValue>;

/// One target entity's queued correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub id: u64,
    pub name: String,
    pub source_link: String,
    pub status: UpdateStatus,
    /// Target field → source path the new value was read from.
    #[serde(default, alias = "change_source_mapping")]
    pub field_provenance: BTreeMap<String, String>,
    pub changes: PartialEntity,
}

impl ChangeRecord {
    pub fn is_pending(&self) -> bool {
        self.status == UpdateStatus::Pending
    }

    pub fn changed_fields(&self) -> Vec<&str> {
        self.changes.keys().map(String::as_str).collect()
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// All change records for one resource, keyed (and iterated) by target id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateQueue {
    #[serde(default)]
    pub updates: BTreeMap<u64, ChangeRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub submitted: usize,
    pub failed: usize,
}

impl UpdateQueue {
    pub fn get(&self, id: u64) -> Option<&ChangeRecord> {
        self.updates.get(&id)
    }

    /// Submitted or failed records are never recomputed.
    pub fn is_finalized(&self, id: u64) -> bool {
        self.updates.get(&id).is_some_and(|r| !r.is_pending())
    }

    pub fn insert(&mut self, record: ChangeRecord) {
        self.updates.insert(record.id, record);
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.updates.values().filter(|r| r.is_pending())
    }

    pub fn stats(&self) -> QueueStats {
        let mut stats = QueueStats {
            total: self.updates.len(),
            ..QueueStats::default()
        };
        for record in self.updates.values() {
            match record.status {
                UpdateStatus::Pending => stats.pending += 1,
                UpdateStatus::Submitted => stats.submitted += 1,
                UpdateStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Submits one change record to the target system.
///
/// `Ok(true)` = submitted, `Ok(false)` = refused. Implementations must not
/// perform the side-effecting submission when `dry_run` is set.
pub trait Applier {
    fn apply(
        &mut self,
        resource: ResourceType,
        record: &ChangeRecord,
        dry_run: bool,
    ) -> Result<bool, ApplyError>;
}

/// Persistent home of one queue document per resource.
pub trait QueueStore {
    fn load_queue(&self, resource: ResourceType) -> Result<UpdateQueue, StoreError>;
    fn save_queue(&self, resource: ResourceType, queue: &UpdateQueue) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Apply loop
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Run every step except the queue write and the external submission.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub attempted: usize,
    pub submitted: usize,
    pub failed: usize,
    /// Records already submitted or failed before this run.
    pub skipped: usize,
}

/// Replay pending records in ascending id order, persisting the queue after
/// every status transition.
///
/// A failing or refusing applier only marks its record failed; the loop moves
/// on. A failed queue write returns `Err` at once: later records are not
/// attempted, since their outcome could not be recorded. Every transition
/// before the failing write is already on disk.
pub fn apply_updates(
    resource: ResourceType,
    queue: &mut UpdateQueue,
    applier: &mut dyn Applier,
    store: &dyn QueueStore,
    options: ApplyOptions,
) -> Result<ApplySummary, StoreError> {
    let mut summary = ApplySummary::default();
    let ids: Vec<u64> = queue.updates.keys().copied().collect();

    for id in ids {
        let Some(record) = queue.updates.get(&id) else {
            continue;
        };
        if !record.is_pending() {
            summary.skipped += 1;
            continue;
        }

        summary.attempted += 1;
        let status = match applier.apply(resource, record, options.dry_run) {
            Ok(true) => UpdateStatus::Submitted,
            Ok(false) => {
                warn!(%resource, id, name = %record.name, "update refused");
                UpdateStatus::Failed
            }
            Err(e) => {
                error!(
                    %resource,
                    id,
                    name = %record.name,
                    error = %e,
                    unexpected = true,
                    "failed to update"
                );
                UpdateStatus::Failed
            }
        };

        if let Some(record) = queue.updates.get_mut(&id) {
            record.status = status;
        }
        match status {
            UpdateStatus::Submitted => summary.submitted += 1,
            _ => summary.failed += 1,
        }
        info!(%resource, id, %status, dry_run = options.dry_run, "update processed");

        if !options.dry_run {
            store.save_queue(resource, queue)?;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn record(id: u64, status: UpdateStatus) -> ChangeRecord {
        ChangeRecord {
            id,
            name: format!("entity {id}"),
            source_link: format!("https://wiki.test/{id}"),
            status,
            field_provenance: BTreeMap::from([("uuid".to_string(), "uuid".to_string())]),
            changes: BTreeMap::from([("uuid".to_string(), FieldValue::Text(format!("u-{id}")))]),
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        saves: RefCell<Vec<UpdateQueue>>,
    }

    impl QueueStore for MemoryStore {
        fn load_queue(&self, _: ResourceType) -> Result<UpdateQueue, StoreError> {
            Ok(self.saves.borrow().last().cloned().unwrap_or_default())
        }

        fn save_queue(&self, _: ResourceType, queue: &UpdateQueue) -> Result<(), StoreError> {
            self.saves.borrow_mut().push(queue.clone());
            Ok(())
        }
    }

    struct Scripted {
        seen: Vec<u64>,
        fail_on: Vec<u64>,
        error_on: Vec<u64>,
    }

    impl Applier for Scripted {
        fn apply(&mut self, _: ResourceType, record: &ChangeRecord, _: bool) -> Result<bool, ApplyError> {
            self.seen.push(record.id);
            if self.error_on.contains(&record.id) {
                return Err(ApplyError::Rejected("form rejected".into()));
            }
            Ok(!self.fail_on.contains(&record.id))
        }
    }

    #[test]
    fn processes_ascending_and_skips_finalized() {
        let mut queue = UpdateQueue::default();
        queue.insert(record(30, UpdateStatus::Pending));
        queue.insert(record(10, UpdateStatus::Pending));
        queue.insert(record(20, UpdateStatus::Submitted));
        queue.insert(record(5, UpdateStatus::Failed));

        let store = MemoryStore::default();
        let mut applier = Scripted { seen: vec![], fail_on: vec![], error_on: vec![] };
        let summary = apply_updates(
            ResourceType::Vehicles,
            &mut queue,
            &mut applier,
            &store,
            ApplyOptions::default(),
        )
        .unwrap();

        assert_eq!(applier.seen, vec![10, 30]);
        assert_eq!(summary, ApplySummary { attempted: 2, submitted: 2, failed: 0, skipped: 2 });
        assert_eq!(store.saves.borrow().len(), 2);
    }

    #[test]
    fn refusal_and_error_both_mark_failed() {
        let mut queue = UpdateQueue::default();
        for id in 1..=3 {
            queue.insert(record(id, UpdateStatus::Pending));
        }

        let store = MemoryStore::default();
        let mut applier = Scripted { seen: vec![], fail_on: vec![1], error_on: vec![2] };
        let summary = apply_updates(
            ResourceType::Items,
            &mut queue,
            &mut applier,
            &store,
            ApplyOptions::default(),
        )
        .unwrap();

        assert_eq!(summary.failed, 2);
        assert_eq!(summary.submitted, 1);
        assert_eq!(queue.get(1).unwrap().status, UpdateStatus::Failed);
        assert_eq!(queue.get(2).unwrap().status, UpdateStatus::Failed);
        assert_eq!(queue.get(3).unwrap().status, UpdateStatus::Submitted);
    }

    #[test]
    fn every_transition_is_persisted() {
        let mut queue = UpdateQueue::default();
        for id in 1..=3 {
            queue.insert(record(id, UpdateStatus::Pending));
        }

        let store = MemoryStore::default();
        let mut applier = Scripted { seen: vec![], fail_on: vec![2], error_on: vec![] };
        apply_updates(ResourceType::Vehicles, &mut queue, &mut applier, &store, ApplyOptions::default())
            .unwrap();

        let saves = store.saves.borrow();
        assert_eq!(saves.len(), 3);
        // Snapshot after the first record: only record 1 has moved.
        assert_eq!(saves[0].get(1).unwrap().status, UpdateStatus::Submitted);
        assert_eq!(saves[0].get(2).unwrap().status, UpdateStatus::Pending);
        assert_eq!(saves[0].get(3).unwrap().status, UpdateStatus::Pending);
        // After the second: record 2 failed, record 3 untouched.
        assert_eq!(saves[1].get(2).unwrap().status, UpdateStatus::Failed);
        assert_eq!(saves[1].get(3).unwrap().status, UpdateStatus::Pending);
        assert_eq!(saves[2].get(3).unwrap().status, UpdateStatus::Submitted);
    }

    #[test]
    fn dry_run_never_persists() {
        let mut queue = UpdateQueue::default();
        queue.insert(record(1, UpdateStatus::Pending));

        let store = MemoryStore::default();
        let mut applier = Scripted { seen: vec![], fail_on: vec![], error_on: vec![] };
        let summary = apply_updates(
            ResourceType::Vehicles,
            &mut queue,
            &mut applier,
            &store,
            ApplyOptions { dry_run: true },
        )
        .unwrap();

        assert_eq!(summary.submitted, 1);
        assert!(store.saves.borrow().is_empty());
    }

    #[test]
    fn legacy_provenance_key_accepted() {
        let json = r#"{"updates": {"42": {
            "id": 42, "name": "Aurora", "source_link": "https://wiki.test/Aurora",
            "status": "submitted",
            "change_source_mapping": {"scu": "cargo_capacity"},
            "changes": {"scu": 12.0}
        }}}"#;
        let queue: UpdateQueue = serde_json::from_str(json).unwrap();
        let record = queue.get(42).unwrap();
        assert_eq!(record.status, UpdateStatus::Submitted);
        assert_eq!(record.field_provenance["scu"], "cargo_capacity");
        assert_eq!(record.changes["scu"], FieldValue::Float(12.0));
    }

    #[test]
    fn stats_count_by_status() {
        let mut queue = UpdateQueue::default();
        queue.insert(record(1, UpdateStatus::Pending));
        queue.insert(record(2, UpdateStatus::Failed));
        queue.insert(record(3, UpdateStatus::Submitted));
        queue.insert(record(4, UpdateStatus::Submitted));
        assert_eq!(
            queue.stats(),
            QueueStats { total: 4, pending: 1, submitted: 2, failed: 1 }
        );
    }

    struct FailingStore {
        saves: RefCell<usize>,
        fail_at: usize,
    }

    impl QueueStore for FailingStore {
        fn load_queue(&self, _: ResourceType) -> Result<UpdateQueue, StoreError> {
            Ok(UpdateQueue::default())
        }

        fn save_queue(&self, _: ResourceType, _: &UpdateQueue) -> Result<(), StoreError> {
            *self.saves.borrow_mut() += 1;
            if *self.saves.borrow() == self.fail_at {
                return Err(StoreError::Io {
                    path: "updates/vehicles_updates.json".into(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn store_failure_stops_before_next_record() {
        let mut queue = UpdateQueue::default();
        for id in 1..=3 {
            queue.insert(record(id, UpdateStatus::Pending));
        }

        let store = FailingStore { saves: RefCell::new(0), fail_at: 2 };
        let mut applier = Scripted { seen: vec![], fail_on: vec![], error_on: vec![] };
        let result = apply_updates(
            ResourceType::Vehicles,
            &mut queue,
            &mut applier,
            &store,
            ApplyOptions::default(),
        );

        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert_eq!(applier.seen, vec![1, 2]);
        assert_eq!(queue.get(3).map(|r| r.status), Some(UpdateStatus::Pending));
    }
}
