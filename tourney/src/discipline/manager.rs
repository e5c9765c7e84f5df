//! Discipline manager for issuing cards and lifting bans.

use super::models::{
    ActionKind, Card, CardRequest, DisciplinaryAction, DisciplinePolicy, DisciplineRecord,
    DisciplineStatus,
};
use crate::config::EngineConfig;
use crate::db::{Changeset, CommitOutcome, RecordStore, Repository, StoreError, Versioned};
use crate::ids::{ActionId, MatchId, ParticipantId, TournamentId};
use crate::matches::Match;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Discipline errors
#[derive(Debug, Error)]
pub enum DisciplineError {
    #[error("Orange cards must name a match")]
    MatchRequired,

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("{participant} did not play in match {match_id}")]
    NotInMatch {
        participant: ParticipantId,
        match_id: MatchId,
    },

    #[error("Concurrent update: gave up after {attempts} attempts")]
    ConcurrentUpdate { attempts: u32 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type DisciplineResult<T> = Result<T, DisciplineError>;

/// Discipline manager
///
/// Sanctions live on one record per participant. Every card or lifted ban is
/// also written as a [`DisciplinaryAction`] in the same commit.
#[derive(Clone)]
pub struct DisciplineManager {
    repo: Repository,
    policy: DisciplinePolicy,
    max_attempts: u32,
}

impl DisciplineManager {
    /// Create a new discipline manager
    pub fn new(store: Arc<dyn RecordStore>, config: &EngineConfig) -> Self {
        Self {
            repo: Repository::new(store),
            policy: DisciplinePolicy::from(config),
            max_attempts: config.max_commit_attempts,
        }
    }

    /// Issue a card at `now`
    ///
    /// # Errors
    ///
    /// - `MatchRequired` for an orange card without a match
    /// - `MatchNotFound` / `NotInMatch` if the named match does not involve the
    ///   participant
    pub async fn issue_card(
        &self,
        request: CardRequest,
        now: DateTime<Utc>,
    ) -> DisciplineResult<DisciplinaryAction> {
        if request.card == Card::Orange && request.match_id.is_none() {
            return Err(DisciplineError::MatchRequired);
        }

        for attempt in 1..=self.max_attempts {
            let mut changes = Changeset::new();
            let action_id = ActionId::new();

            let mut record = self.load_or_new(request.participant).await?;
            let outcome = record.apply(
                action_id,
                request.card,
                request.match_id,
                now,
                self.policy,
            );

            if request.card == Card::Orange {
                let match_id = request.match_id.ok_or(DisciplineError::MatchRequired)?;
                let mut game = self
                    .repo
                    .get::<Match>(match_id)
                    .await?
                    .ok_or(DisciplineError::MatchNotFound(match_id))?;
                if !game.involves(request.participant) {
                    return Err(DisciplineError::NotInMatch {
                        participant: request.participant,
                        match_id,
                    });
                }
                if !game.orange_carded.contains(&request.participant) {
                    game.orange_carded.push(request.participant);
                    changes.update(&game)?;
                }
            }

            let action = DisciplinaryAction {
                id: action_id,
                participant: request.participant,
                tournament: request.tournament,
                kind: ActionKind::Card(request.card),
                match_id: request.match_id,
                reason: request.reason.clone(),
                issued_by: request.issued_by,
                issued_at: now,
                outcome,
            };
            changes.insert(&action)?;
            stage(&mut changes, record)?;

            match self.repo.commit(changes).await? {
                CommitOutcome::Committed => {
                    log::info!(
                        "Issued {} to {} ({:?})",
                        request.card,
                        request.participant,
                        action.outcome
                    );
                    return Ok(action);
                }
                CommitOutcome::Conflict { kind, id } => log::warn!(
                    "Card for {} conflicted on {kind} {id} (attempt {attempt}/{})",
                    request.participant,
                    self.max_attempts
                ),
            }
        }

        Err(DisciplineError::ConcurrentUpdate {
            attempts: self.max_attempts,
        })
    }

    /// Lift a ban early; returns `None` if the participant had nothing to lift
    pub async fn lift_ban(
        &self,
        participant: ParticipantId,
        tournament: TournamentId,
        lifted_by: ParticipantId,
        now: DateTime<Utc>,
    ) -> DisciplineResult<Option<DisciplinaryAction>> {
        for attempt in 1..=self.max_attempts {
            let Some(mut record) = self
                .repo
                .get::<DisciplineRecord>(DisciplineRecord::id_for(participant))
                .await?
            else {
                return Ok(None);
            };
            if !record.lift(now) {
                return Ok(None);
            }

            let action = DisciplinaryAction {
                id: ActionId::new(),
                participant,
                tournament,
                kind: ActionKind::BanLifted,
                match_id: None,
                reason: "Ban lifted".to_string(),
                issued_by: lifted_by,
                issued_at: now,
                outcome: None,
            };
            record.actions.push(action.id);

            let mut changes = Changeset::new();
            changes.insert(&action)?;
            changes.update(&record)?;

            match self.repo.commit(changes).await? {
                CommitOutcome::Committed => {
                    log::info!("Lifted sanctions on {participant}");
                    return Ok(Some(action));
                }
                CommitOutcome::Conflict { .. } => log::warn!(
                    "Lifting ban of {participant} conflicted (attempt {attempt}/{})",
                    self.max_attempts
                ),
            }
        }

        Err(DisciplineError::ConcurrentUpdate {
            attempts: self.max_attempts,
        })
    }

    pub async fn status(
        &self,
        participant: ParticipantId,
        now: DateTime<Utc>,
    ) -> DisciplineResult<DisciplineStatus> {
        Ok(self
            .repo
            .get::<DisciplineRecord>(DisciplineRecord::id_for(participant))
            .await?
            .map_or_else(
                || DisciplineStatus::clean(participant),
                |record| record.status(now),
            ))
    }

    /// Statuses in the order asked for; participants without a record are clean
    pub async fn statuses(
        &self,
        participants: &[ParticipantId],
        now: DateTime<Utc>,
    ) -> DisciplineResult<Vec<DisciplineStatus>> {
        let ids: Vec<_> = participants
            .iter()
            .map(|&participant| DisciplineRecord::id_for(participant))
            .collect();
        let records = self.repo.get_many::<DisciplineRecord>(&ids).await?;

        Ok(participants
            .iter()
            .map(|&participant| {
                records
                    .iter()
                    .find(|record| record.participant == participant)
                    .map_or_else(
                        || DisciplineStatus::clean(participant),
                        |record| record.status(now),
                    )
            })
            .collect())
    }

    /// Every action issued to a participant, oldest first
    pub async fn history(
        &self,
        participant: ParticipantId,
    ) -> DisciplineResult<Vec<DisciplinaryAction>> {
        let Some(record) = self
            .repo
            .get::<DisciplineRecord>(DisciplineRecord::id_for(participant))
            .await?
        else {
            return Ok(Vec::new());
        };

        Ok(self
            .repo
            .get_many::<DisciplinaryAction>(&record.actions)
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .collect())
    }

    async fn load_or_new(&self, participant: ParticipantId) -> DisciplineResult<Staged> {
        let existing = self
            .repo
            .get::<DisciplineRecord>(DisciplineRecord::id_for(participant))
            .await?;
        Ok(match existing {
            Some(record) => Staged::Existing(record),
            None => Staged::New(DisciplineRecord::new(participant)),
        })
    }
}

/// A discipline record that is either already stored or about to be created
enum Staged {
    Existing(Versioned<DisciplineRecord>),
    New(DisciplineRecord),
}

impl std::ops::Deref for Staged {
    type Target = DisciplineRecord;

    fn deref(&self) -> &DisciplineRecord {
        match self {
            Staged::Existing(record) => &record.value,
            Staged::New(record) => record,
        }
    }
}

impl std::ops::DerefMut for Staged {
    fn deref_mut(&mut self) -> &mut DisciplineRecord {
        match self {
            Staged::Existing(record) => &mut record.value,
            Staged::New(record) => record,
        }
    }
}

fn stage(changes: &mut Changeset, record: Staged) -> Result<(), StoreError> {
    match record {
        Staged::Existing(record) => changes.update(&record),
        Staged::New(record) => changes.insert(&record),
    }
}
