//! Best-of-N series.
//!
//! A series is decided the moment either side reaches `(best_of + 1) / 2`
//! wins. Until then every completed game schedules exactly one more.

use super::models::RoundStage;
use crate::db::{Record, RecordKind};
use crate::errors::{TournamentError, TournamentResult};
use crate::ids::{KnockoutId, MatchId, ParticipantId, SeriesId};
use crate::matches::{Match, MatchContainer, MatchStatus, RoundTag, StageStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub id: SeriesId,
    pub knockout: KnockoutId,
    pub stage: RoundStage,
    pub name: String,
    pub player1: ParticipantId,
    pub player2: ParticipantId,
    pub best_of: u32,
    pub wins_p1: u32,
    pub wins_p2: u32,
    pub matches: Vec<MatchId>,
    pub winner: Option<ParticipantId>,
    pub status: StageStatus,
}

/// What a completed game did to its series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesProgress {
    /// Nobody has enough wins; this game number is next
    NextGame(u32),
    /// The series is over
    Decided(ParticipantId),
}

/// Series lengths must be odd so that a winner always exists
pub fn validate_best_of(best_of: u32) -> TournamentResult<()> {
    if best_of == 0 || best_of % 2 == 0 {
        return Err(TournamentError::InvalidBestOf(best_of));
    }
    Ok(())
}

impl Series {
    pub fn new(
        knockout: KnockoutId,
        stage: RoundStage,
        name: impl Into<String>,
        player1: ParticipantId,
        player2: ParticipantId,
        best_of: u32,
    ) -> TournamentResult<Self> {
        validate_best_of(best_of)?;
        if player1 == player2 {
            return Err(TournamentError::DuplicateParticipant(player1));
        }

        Ok(Self {
            id: SeriesId::new(),
            knockout,
            stage,
            name: name.into(),
            player1,
            player2,
            best_of,
            wins_p1: 0,
            wins_p2: 0,
            matches: Vec::new(),
            winner: None,
            status: StageStatus::Upcoming,
        })
    }

    pub fn wins_needed(&self) -> u32 {
        self.best_of.div_ceil(2)
    }

    pub fn games_played(&self) -> u32 {
        self.wins_p1 + self.wins_p2
    }

    pub fn loser(&self) -> Option<ParticipantId> {
        match self.winner {
            Some(winner) if winner == self.player1 => Some(self.player2),
            Some(_) => Some(self.player1),
            None => None,
        }
    }

    /// Build game `number` of this series; the caller stores and appends it
    pub fn game(&self, number: u32, status: MatchStatus) -> Match {
        Match::new(
            self.player1,
            self.player2,
            RoundTag::SeriesGame {
                stage: self.stage,
                game: number,
            },
            format!("{} - Game {number}", self.name),
            MatchContainer::Series(self.id),
            status,
        )
    }

    /// Count a completed game towards the series
    pub fn record_game(&mut self, winner: ParticipantId) -> TournamentResult<SeriesProgress> {
        if self.status == StageStatus::Completed {
            return Err(TournamentError::InvalidState {
                entity: "series",
                expected: "Upcoming or Active".to_string(),
                actual: self.status.to_string(),
            });
        }

        if winner == self.player1 {
            self.wins_p1 += 1;
        } else if winner == self.player2 {
            self.wins_p2 += 1;
        } else {
            return Err(TournamentError::NotAParticipant {
                participant: winner,
            });
        }

        if self.wins_p1.max(self.wins_p2) >= self.wins_needed() {
            self.winner = Some(winner);
            self.status = StageStatus::Completed;
            Ok(SeriesProgress::Decided(winner))
        } else {
            self.status = StageStatus::Active;
            Ok(SeriesProgress::NextGame(self.games_played() + 1))
        }
    }
}

impl Record for Series {
    const KIND: RecordKind = RecordKind::Series;
    type Id = SeriesId;

    fn record_id(&self) -> SeriesId {
        self.id
    }
}
