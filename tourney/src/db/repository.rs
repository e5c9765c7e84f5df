//! Versioned record storage.
//!
//! Every engine entity is stored as an independent JSON document keyed by
//! `(kind, id)` and carrying a version counter. Writers read a record, decide a
//! transition, and commit a batch of writes that each name the version they
//! read. A store applies the whole batch or nothing, so a writer that lost a
//! race learns about it through [`CommitOutcome::Conflict`] instead of
//! overwriting someone else's progress.

use super::errors::{StoreError, StoreResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use uuid::Uuid;

/// Kinds of record the engine persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    Tournament,
    League,
    Knockout,
    Series,
    Match,
    Points,
    Discipline,
    DisciplinaryAction,
}

impl RecordKind {
    pub const ALL: [RecordKind; 8] = [
        RecordKind::Tournament,
        RecordKind::League,
        RecordKind::Knockout,
        RecordKind::Series,
        RecordKind::Match,
        RecordKind::Points,
        RecordKind::Discipline,
        RecordKind::DisciplinaryAction,
    ];

    /// Stable storage name
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Tournament => "tournament",
            RecordKind::League => "league",
            RecordKind::Knockout => "knockout",
            RecordKind::Series => "series",
            RecordKind::Match => "match",
            RecordKind::Points => "points",
            RecordKind::Discipline => "discipline",
            RecordKind::DisciplinaryAction => "disciplinary_action",
        }
    }

    /// Parse a storage name back into a kind
    pub fn parse(name: &str) -> StoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| StoreError::UnknownKind(name.to_string()))
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record as the store sees it
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub kind: RecordKind,
    pub id: Uuid,
    pub version: i64,
    pub body: serde_json::Value,
}

/// One write inside an atomic commit
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create a record that must not exist yet; it starts at version 1
    Insert {
        kind: RecordKind,
        id: Uuid,
        body: serde_json::Value,
    },
    /// Replace a record whose current version must equal `expected_version`
    Update {
        kind: RecordKind,
        id: Uuid,
        expected_version: i64,
        body: serde_json::Value,
    },
}

impl Write {
    pub fn kind(&self) -> RecordKind {
        match self {
            Write::Insert { kind, .. } | Write::Update { kind, .. } => *kind,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Write::Insert { id, .. } | Write::Update { id, .. } => *id,
        }
    }

    pub fn body(&self) -> &serde_json::Value {
        match self {
            Write::Insert { body, .. } | Write::Update { body, .. } => body,
        }
    }

    fn set_body(&mut self, new_body: serde_json::Value) {
        match self {
            Write::Insert { body, .. } | Write::Update { body, .. } => *body = new_body,
        }
    }
}

/// Result of an atomic commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every write was applied
    Committed,
    /// A guard failed on this record; nothing was applied
    Conflict { kind: RecordKind, id: Uuid },
}

/// Storage backend for versioned records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load a single record
    async fn fetch(&self, kind: RecordKind, id: Uuid) -> StoreResult<Option<StoredRecord>>;

    /// Load several records of one kind, in the order of `ids`; missing ids are skipped
    async fn fetch_many(&self, kind: RecordKind, ids: &[Uuid]) -> StoreResult<Vec<StoredRecord>>;

    /// Apply every write or none of them
    async fn commit(&self, writes: Vec<Write>) -> StoreResult<CommitOutcome>;
}

/// An engine entity that can be stored
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const KIND: RecordKind;
    type Id: Copy + Into<Uuid> + Send + Sync;

    fn record_id(&self) -> Self::Id;
}

/// A decoded record together with the version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: i64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Versioned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Versioned<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<R: Record> TryFrom<StoredRecord> for Versioned<R> {
    type Error = StoreError;

    fn try_from(stored: StoredRecord) -> StoreResult<Self> {
        Ok(Versioned {
            version: stored.version,
            value: serde_json::from_value(stored.body)?,
        })
    }
}

/// Pending writes for one commit
///
/// Staging the same record twice keeps a single write carrying the latest body,
/// so a transition may touch a record repeatedly before it commits.
#[derive(Debug, Default)]
pub struct Changeset {
    writes: Vec<Write>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a brand new record
    pub fn insert<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        let body = serde_json::to_value(record)?;
        self.push(Write::Insert {
            kind: R::KIND,
            id: record.record_id().into(),
            body,
        });
        Ok(())
    }

    /// Stage a replacement guarded by the version the record was read at
    pub fn update<R: Record>(&mut self, record: &Versioned<R>) -> StoreResult<()> {
        let body = serde_json::to_value(&record.value)?;
        self.push(Write::Update {
            kind: R::KIND,
            id: record.record_id().into(),
            expected_version: record.version,
            body,
        });
        Ok(())
    }

    fn push(&mut self, write: Write) {
        let existing = self
            .writes
            .iter_mut()
            .find(|staged| staged.kind() == write.kind() && staged.id() == write.id());

        match existing {
            Some(staged) => staged.set_body(write.body().clone()),
            None => self.writes.push(write),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Typed access to a record store
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn RecordStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Load a record by id
    pub async fn get<R: Record>(&self, id: R::Id) -> StoreResult<Option<Versioned<R>>> {
        self.store
            .fetch(R::KIND, id.into())
            .await?
            .map(Versioned::try_from)
            .transpose()
    }

    /// Load several records by id; missing ids are skipped
    pub async fn get_many<R: Record>(&self, ids: &[R::Id]) -> StoreResult<Vec<Versioned<R>>> {
        let ids: Vec<Uuid> = ids.iter().map(|&id| id.into()).collect();
        self.store
            .fetch_many(R::KIND, &ids)
            .await?
            .into_iter()
            .map(Versioned::try_from)
            .collect()
    }

    /// Commit staged writes atomically
    pub async fn commit(&self, changes: Changeset) -> StoreResult<CommitOutcome> {
        if changes.is_empty() {
            return Ok(CommitOutcome::Committed);
        }
        self.store.commit(changes.into_writes()).await
    }
}
