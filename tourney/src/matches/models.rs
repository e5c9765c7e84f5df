use super::composite::Composite;
use crate::bracket::RoundStage;
use crate::db::{Record, RecordKind};
use crate::errors::{TournamentError, TournamentResult};
use crate::ids::{KnockoutId, LeagueId, MatchId, ParticipantId, SeriesId, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Created but not yet visible to participants
    Unpublished,
    Scheduled,
    Completed,
}

/// Lifecycle shared by leagues, knockouts and series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageStatus {
    Upcoming,
    Active,
    Completed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageStatus::Upcoming => "Upcoming",
            StageStatus::Active => "Active",
            StageStatus::Completed => "Completed",
        };
        f.write_str(name)
    }
}

/// The entity a match belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchContainer {
    League(LeagueId),
    Knockout(KnockoutId),
    Series(SeriesId),
}

impl MatchContainer {
    /// Only round-robin matches may end without a winner
    pub fn allows_draws(&self) -> bool {
        matches!(self, MatchContainer::League(_))
    }
}

/// Structured round position of a match; display labels are never parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundTag {
    League { round: u32 },
    Knockout { stage: RoundStage, slot: u32 },
    SeriesGame { stage: RoundStage, game: u32 },
}

/// A two-sided fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub side_a: ParticipantId,
    pub side_b: ParticipantId,
    pub score_a: u32,
    pub score_b: u32,
    /// `None` on a completed match means a draw
    pub winner: Option<ParticipantId>,
    pub status: MatchStatus,
    pub round: RoundTag,
    pub label: String,
    pub container: MatchContainer,
    /// Squad matches decided by individual sub-contests
    #[serde(default)]
    pub composite: Option<Composite>,
    /// Players sanctioned with an orange card in this match
    #[serde(default)]
    pub orange_carded: Vec<ParticipantId>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn new(
        side_a: ParticipantId,
        side_b: ParticipantId,
        round: RoundTag,
        label: impl Into<String>,
        container: MatchContainer,
        status: MatchStatus,
    ) -> Self {
        Self {
            id: MatchId::new(),
            side_a,
            side_b,
            score_a: 0,
            score_b: 0,
            winner: None,
            status,
            round,
            label: label.into(),
            container,
            composite: None,
            orange_carded: Vec::new(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn participant(&self, side: Side) -> ParticipantId {
        match side {
            Side::A => self.side_a,
            Side::B => self.side_b,
        }
    }

    pub fn side_of(&self, participant: ParticipantId) -> Option<Side> {
        if participant == self.side_a {
            Some(Side::A)
        } else if participant == self.side_b {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn involves(&self, participant: ParticipantId) -> bool {
        self.side_of(participant).is_some()
    }

    /// Losing side of a decided match
    pub fn loser(&self) -> Option<ParticipantId> {
        let winner = self.winner?;
        self.side_of(winner)
            .map(|side| self.participant(side.opposite()))
    }

    /// Goals scored by each side
    ///
    /// Squad matches count the raw sub-contest scores; `score_a`/`score_b` hold
    /// their sub-contest points instead.
    pub fn goals(&self) -> (u32, u32) {
        match &self.composite {
            Some(composite) if !composite.sub_contests.is_empty() => composite.goals(),
            _ => (self.score_a, self.score_b),
        }
    }

    /// Record a final score and resolve the winner, completed at `at`
    pub fn record_result(
        &mut self,
        score_a: u32,
        score_b: u32,
        tie_break: Option<ParticipantId>,
        at: DateTime<Utc>,
    ) -> TournamentResult<Option<ParticipantId>> {
        if self.is_completed() {
            return Err(TournamentError::InvalidState {
                entity: "match",
                expected: "open".to_string(),
                actual: "Completed".to_string(),
            });
        }

        let winner = resolve_winner(
            self.id,
            (self.side_a, self.side_b),
            (score_a, score_b),
            self.container.allows_draws(),
            tie_break,
        )?;

        self.score_a = score_a;
        self.score_b = score_b;
        self.winner = winner;
        self.status = MatchStatus::Completed;
        self.completed_at = Some(at);
        Ok(winner)
    }
}

impl Record for Match {
    const KIND: RecordKind = RecordKind::Match;
    type Id = MatchId;

    fn record_id(&self) -> MatchId {
        self.id
    }
}

/// Decide the winner of a two-sided contest
///
/// A higher score wins outright and any tie-break is ignored. A level score is
/// a draw where draws are allowed; elsewhere the tie-break must name one of
/// the two sides.
pub fn resolve_winner(
    match_id: MatchId,
    (side_a, side_b): (ParticipantId, ParticipantId),
    (score_a, score_b): (u32, u32),
    allows_draw: bool,
    tie_break: Option<ParticipantId>,
) -> TournamentResult<Option<ParticipantId>> {
    if score_a > score_b {
        return Ok(Some(side_a));
    }
    if score_b > score_a {
        return Ok(Some(side_b));
    }
    if allows_draw {
        return Ok(None);
    }

    match tie_break {
        None => Err(TournamentError::TieBreakRequired { match_id }),
        Some(participant) if participant == side_a || participant == side_b => {
            Ok(Some(participant))
        }
        Some(participant) => Err(TournamentError::InvalidTieBreak {
            match_id,
            participant,
        }),
    }
}
