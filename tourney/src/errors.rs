//! Engine error types.

use crate::db::{RecordKind, StoreError};
use crate::ids::{MatchId, ParticipantId};
use thiserror::Error;
use uuid::Uuid;

/// Tournament progression errors
#[derive(Debug, Error)]
pub enum TournamentError {
    /// A referenced record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: Uuid },

    /// Not enough participants for the requested operation
    #[error("Insufficient participants: need {needed}, have {current}")]
    InsufficientParticipants { needed: usize, current: usize },

    /// Registration only happens while a league is upcoming
    #[error("Registration is closed")]
    RegistrationClosed,

    /// League already holds its maximum number of participants
    #[error("League is full ({max} participants)")]
    LeagueFull { max: usize },

    /// Participant registered twice
    #[error("{0} is already registered")]
    AlreadyRegistered(ParticipantId),

    /// Participant listed twice in a seed or fixture list
    #[error("{0} appears more than once")]
    DuplicateParticipant(ParticipantId),

    /// Only single, double and triple round-robins exist
    #[error("Unsupported number of legs: {0}")]
    UnsupportedLegs(u8),

    /// Bracket sizes must be powers of two
    #[error("Invalid bracket size: {0}")]
    InvalidBracketSize(usize),

    /// Series lengths must be odd
    #[error("Invalid best-of value: {0}")]
    InvalidBestOf(u32),

    /// Record is not in the state the operation requires
    #[error("{entity} in wrong state: expected {expected}, got {actual}")]
    InvalidState {
        entity: &'static str,
        expected: String,
        actual: String,
    },

    /// Publish request matched no unpublished match
    #[error("Nothing to publish: {0}")]
    NothingToPublish(String),

    /// Participant is not part of the fixture or container
    #[error("{participant} is not a participant here")]
    NotAParticipant { participant: ParticipantId },

    /// A squad lineup names a player the other side already fields
    #[error("{0} is already in the other side's lineup")]
    LineupConflict(ParticipantId),

    /// Level knockout or series score submitted without a decisive winner
    #[error("Match {match_id} ended level: a tie-break winner is required")]
    TieBreakRequired { match_id: MatchId },

    /// Tie-break winner is not one of the two sides
    #[error("Tie-break winner {participant} is not a side of match {match_id}")]
    InvalidTieBreak {
        match_id: MatchId,
        participant: ParticipantId,
    },

    /// Points aggregation attempted before both phases were scored
    #[error("Points are incomplete for {participant}")]
    IncompletePoints { participant: ParticipantId },

    /// A phase result was needed before it existed
    #[error("Phase not finalized: {0}")]
    PhaseNotFinalized(String),

    /// Operation not offered by this tournament format
    #[error("Unsupported for this format: {0}")]
    UnsupportedOperation(String),

    /// Persisted state contradicts itself
    #[error("Data integrity fault: {0}")]
    DataIntegrity(String),

    /// Optimistic concurrency retries exhausted
    #[error("Concurrent update: gave up after {attempts} attempts")]
    ConcurrentUpdate { attempts: u32 },

    /// Persistence failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Error taxonomy used by callers to map failures to responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    /// Bad caller input or wrong moment; nothing was changed
    Precondition,
    /// Caller must resubmit with a decisive winner
    MissingTieBreak,
    /// Upstream inconsistency, not caller input
    DataIntegrity,
    Conflict,
    Internal,
}

impl TournamentError {
    /// Classify this error
    pub fn class(&self) -> ErrorClass {
        match self {
            TournamentError::NotFound { .. } => ErrorClass::NotFound,
            TournamentError::TieBreakRequired { .. } => ErrorClass::MissingTieBreak,
            TournamentError::DataIntegrity(_) => ErrorClass::DataIntegrity,
            TournamentError::ConcurrentUpdate { .. } => ErrorClass::Conflict,
            TournamentError::Store(_) => ErrorClass::Internal,
            TournamentError::InsufficientParticipants { .. }
            | TournamentError::RegistrationClosed
            | TournamentError::LeagueFull { .. }
            | TournamentError::AlreadyRegistered(_)
            | TournamentError::DuplicateParticipant(_)
            | TournamentError::UnsupportedLegs(_)
            | TournamentError::InvalidBracketSize(_)
            | TournamentError::InvalidBestOf(_)
            | TournamentError::InvalidState { .. }
            | TournamentError::NothingToPublish(_)
            | TournamentError::NotAParticipant { .. }
            | TournamentError::LineupConflict(_)
            | TournamentError::InvalidTieBreak { .. }
            | TournamentError::IncompletePoints { .. }
            | TournamentError::PhaseNotFinalized(_)
            | TournamentError::UnsupportedOperation(_) => ErrorClass::Precondition,
        }
    }

    /// Get a client-safe error message
    ///
    /// Store failures and integrity faults are reported generically so that
    /// storage details never reach a client.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Store(_) => "Internal server error".to_string(),
            TournamentError::DataIntegrity(_) => "Tournament data is inconsistent".to_string(),
            TournamentError::NotFound { kind, .. } => format!("{kind} not found"),
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_break_is_its_own_class() {
        let err = TournamentError::TieBreakRequired {
            match_id: MatchId::new(),
        };
        assert_eq!(err.class(), ErrorClass::MissingTieBreak);
    }

    #[test]
    fn test_integrity_faults_are_distinct_from_preconditions() {
        let integrity = TournamentError::DataIntegrity("missing".to_string());
        let precondition = TournamentError::IncompletePoints {
            participant: ParticipantId(1),
        };
        assert_eq!(integrity.class(), ErrorClass::DataIntegrity);
        assert_eq!(precondition.class(), ErrorClass::Precondition);
    }

    #[test]
    fn test_client_message_hides_store_details() {
        let err = TournamentError::Store(StoreError::Unavailable("lock poisoned".to_string()));
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(err.class(), ErrorClass::Internal);
    }

    #[test]
    fn test_client_message_hides_record_ids() {
        let id = Uuid::new_v4();
        let err = TournamentError::NotFound {
            kind: RecordKind::League,
            id,
        };
        assert_eq!(err.client_message(), "league not found");
        assert!(err.to_string().contains(&id.to_string()));
    }
}
