//! In-process record store.

use super::errors::{StoreError, StoreResult};
use super::repository::{CommitOutcome, RecordKind, RecordStore, StoredRecord, Write};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

type Key = (RecordKind, Uuid);

/// Record store backed by a mutex-guarded map
///
/// Commits run under a single lock, which gives the same all-or-nothing
/// behaviour as a database transaction. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Arc<Mutex<HashMap<Key, StoredRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records of one kind
    pub fn count(&self, kind: RecordKind) -> StoreResult<usize> {
        Ok(self.lock()?.keys().filter(|(k, _)| *k == kind).count())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<Key, StoredRecord>>> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("record map lock poisoned".to_string()))
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn fetch(&self, kind: RecordKind, id: Uuid) -> StoreResult<Option<StoredRecord>> {
        Ok(self.lock()?.get(&(kind, id)).cloned())
    }

    async fn fetch_many(&self, kind: RecordKind, ids: &[Uuid]) -> StoreResult<Vec<StoredRecord>> {
        let records = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| records.get(&(kind, *id)).cloned())
            .collect())
    }

    async fn commit(&self, writes: Vec<Write>) -> StoreResult<CommitOutcome> {
        let mut records = self.lock()?;

        let mut seen = HashSet::new();
        for write in &writes {
            let key = (write.kind(), write.id());
            if !seen.insert(key) {
                return Err(StoreError::DuplicateWrite {
                    kind: key.0,
                    id: key.1,
                });
            }

            let guard_holds = match write {
                Write::Insert { .. } => !records.contains_key(&key),
                Write::Update {
                    expected_version, ..
                } => records
                    .get(&key)
                    .is_some_and(|current| current.version == *expected_version),
            };
            if !guard_holds {
                return Ok(CommitOutcome::Conflict {
                    kind: key.0,
                    id: key.1,
                });
            }
        }

        for write in writes {
            let (kind, id, version, body) = match write {
                Write::Insert { kind, id, body } => (kind, id, 1, body),
                Write::Update {
                    kind,
                    id,
                    expected_version,
                    body,
                } => (kind, id, expected_version + 1, body),
            };
            records.insert(
                (kind, id),
                StoredRecord {
                    kind,
                    id,
                    version,
                    body,
                },
            );
        }

        Ok(CommitOutcome::Committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn insert(kind: RecordKind, id: Uuid, body: serde_json::Value) -> Write {
        Write::Insert { kind, id, body }
    }

    #[tokio::test]
    async fn test_insert_then_fetch() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();

        let outcome = store
            .commit(vec![insert(RecordKind::League, id, json!({"name": "Spring"}))])
            .await
            .unwrap();
        assert_eq!(outcome, CommitOutcome::Committed);

        let record = store.fetch(RecordKind::League, id).await.unwrap().unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.body["name"], "Spring");

        // Same id under another kind is a different record
        assert!(store.fetch(RecordKind::Knockout, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_update_conflicts_and_applies_nothing() {
        let store = InMemoryStore::new();
        let league = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        store
            .commit(vec![insert(RecordKind::League, league, json!({"v": 1}))])
            .await
            .unwrap();
        store
            .commit(vec![Write::Update {
                kind: RecordKind::League,
                id: league,
                expected_version: 1,
                body: json!({"v": 2}),
            }])
            .await
            .unwrap();

        let outcome = store
            .commit(vec![
                insert(RecordKind::Match, fresh, json!({})),
                Write::Update {
                    kind: RecordKind::League,
                    id: league,
                    expected_version: 1,
                    body: json!({"v": 3}),
                },
            ])
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CommitOutcome::Conflict {
                kind: RecordKind::League,
                id: league
            }
        );
        assert!(store.fetch(RecordKind::Match, fresh).await.unwrap().is_none());
        let current = store.fetch(RecordKind::League, league).await.unwrap().unwrap();
        assert_eq!(current.version, 2);
        assert_eq!(current.body["v"], 2);
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        store
            .commit(vec![insert(RecordKind::Series, id, json!({}))])
            .await
            .unwrap();

        let outcome = store
            .commit(vec![insert(RecordKind::Series, id, json!({}))])
            .await
            .unwrap();
        assert!(matches!(outcome, CommitOutcome::Conflict { .. }));
        assert_eq!(store.count(RecordKind::Series).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_same_record_twice_in_one_commit_is_rejected() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        let result = store
            .commit(vec![
                insert(RecordKind::Match, id, json!({})),
                insert(RecordKind::Match, id, json!({})),
            ])
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateWrite { .. })));
    }

    #[tokio::test]
    async fn test_fetch_many_preserves_requested_order() {
        let store = InMemoryStore::new();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let writes = ids
            .iter()
            .enumerate()
            .map(|(i, id)| insert(RecordKind::Match, *id, json!({ "n": i })))
            .collect();
        store.commit(writes).await.unwrap();

        let missing = Uuid::new_v4();
        let wanted = [ids[2], missing, ids[0]];
        let records = store.fetch_many(RecordKind::Match, &wanted).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].body["n"], 2);
        assert_eq!(records[1].body["n"], 0);
    }
}
