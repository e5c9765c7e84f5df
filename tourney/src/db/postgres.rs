//! PostgreSQL record store.

use super::errors::StoreResult;
use super::repository::{CommitOutcome, RecordKind, RecordStore, StoredRecord, Write};
use super::timeouts::{
    DEFAULT_TRANSACTION_TIMEOUT, LONG_OPERATION_TIMEOUT, with_default_timeout, with_timeout,
};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const SCHEMA: &str = include_str!("../../migrations/001_initial_schema.sql");

/// Record store on a single `tourney_records` table
///
/// Each commit runs in one transaction. Version guards are enforced with
/// `UPDATE ... WHERE version = $n`; a guard that matches no row rolls the
/// transaction back and reports a conflict.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the records table if it does not exist
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        with_timeout(
            LONG_OPERATION_TIMEOUT,
            sqlx::raw_sql(SCHEMA).execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    fn decode(row: &PgRow) -> StoreResult<StoredRecord> {
        let kind: String = row.try_get("kind")?;
        Ok(StoredRecord {
            kind: RecordKind::parse(&kind)?,
            id: row.try_get("id")?,
            version: row.try_get("version")?,
            body: row.try_get("body")?,
        })
    }

    async fn apply(&self, writes: &[Write]) -> Result<CommitOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for write in writes {
            let affected = match write {
                Write::Insert { kind, id, body } => sqlx::query(
                    "INSERT INTO tourney_records (kind, id, version, body)
                     VALUES ($1, $2, 1, $3)
                     ON CONFLICT (kind, id) DO NOTHING",
                )
                .bind(kind.as_str())
                .bind(id)
                .bind(body)
                .execute(&mut *tx)
                .await?
                .rows_affected(),
                Write::Update {
                    kind,
                    id,
                    expected_version,
                    body,
                } => sqlx::query(
                    "UPDATE tourney_records
                     SET version = version + 1, body = $4, updated_at = NOW()
                     WHERE kind = $1 AND id = $2 AND version = $3",
                )
                .bind(kind.as_str())
                .bind(id)
                .bind(expected_version)
                .bind(body)
                .execute(&mut *tx)
                .await?
                .rows_affected(),
            };

            if affected != 1 {
                tx.rollback().await?;
                return Ok(CommitOutcome::Conflict {
                    kind: write.kind(),
                    id: write.id(),
                });
            }
        }

        tx.commit().await?;
        Ok(CommitOutcome::Committed)
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn fetch(&self, kind: RecordKind, id: Uuid) -> StoreResult<Option<StoredRecord>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT kind, id, version, body FROM tourney_records WHERE kind = $1 AND id = $2",
            )
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn fetch_many(&self, kind: RecordKind, ids: &[Uuid]) -> StoreResult<Vec<StoredRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = with_default_timeout(
            sqlx::query(
                "SELECT kind, id, version, body FROM tourney_records
                 WHERE kind = $1 AND id = ANY($2)",
            )
            .bind(kind.as_str())
            .bind(ids)
            .fetch_all(&self.pool),
        )
        .await?;

        let mut records = rows
            .iter()
            .map(Self::decode)
            .collect::<StoreResult<Vec<_>>>()?;

        // Rows come back in arbitrary order
        let mut ordered = Vec::with_capacity(records.len());
        for id in ids {
            if let Some(index) = records.iter().position(|record| record.id == *id) {
                ordered.push(records.swap_remove(index));
            }
        }
        Ok(ordered)
    }

    async fn commit(&self, writes: Vec<Write>) -> StoreResult<CommitOutcome> {
        let outcome = with_timeout(DEFAULT_TRANSACTION_TIMEOUT, self.apply(&writes)).await?;
        if let CommitOutcome::Conflict { kind, id } = outcome {
            log::debug!("Commit of {} writes conflicted on {kind} {id}", writes.len());
        }
        Ok(outcome)
    }
}
