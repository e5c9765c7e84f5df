//! Persistence error types.

use super::repository::RecordKind;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a record store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Record body could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation timed out
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// A single commit touched the same record twice
    #[error("Duplicate write for {kind} {id}")]
    DuplicateWrite { kind: RecordKind, id: Uuid },

    /// Stored data uses a record kind this build does not know
    #[error("Unknown record kind: {0}")]
    UnknownKind(String),

    /// Store cannot serve requests
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
