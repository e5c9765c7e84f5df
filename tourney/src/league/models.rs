use crate::db::{Record, RecordKind};
use crate::errors::{TournamentError, TournamentResult};
use crate::fixtures::Legs;
use crate::ids::{LeagueId, MatchId, ParticipantId, TournamentId};
use crate::matches::StageStatus;
use crate::standings::StandingsRow;
use serde::{Deserialize, Serialize};

/// Round-robin stage of a tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub tournament: TournamentId,
    pub name: String,
    /// Registration order
    pub participants: Vec<ParticipantId>,
    pub max_participants: usize,
    pub legs: Legs,
    pub matches: Vec<MatchId>,
    pub status: StageStatus,
    /// Final table, written when the league completes
    pub standings_cache: Option<Vec<StandingsRow>>,
}

impl League {
    pub fn new(
        tournament: TournamentId,
        name: impl Into<String>,
        max_participants: usize,
        legs: Legs,
    ) -> Self {
        Self {
            id: LeagueId::new(),
            tournament,
            name: name.into(),
            participants: Vec::new(),
            max_participants,
            legs,
            matches: Vec::new(),
            status: StageStatus::Upcoming,
            standings_cache: None,
        }
    }

    /// Add a participant while registration is open
    pub fn register(&mut self, participant: ParticipantId) -> TournamentResult<()> {
        if self.status != StageStatus::Upcoming {
            return Err(TournamentError::RegistrationClosed);
        }
        if self.participants.contains(&participant) {
            return Err(TournamentError::AlreadyRegistered(participant));
        }
        if self.participants.len() >= self.max_participants {
            return Err(TournamentError::LeagueFull {
                max: self.max_participants,
            });
        }

        self.participants.push(participant);
        Ok(())
    }
}

impl Record for League {
    const KIND: RecordKind = RecordKind::League;
    type Id = LeagueId;

    fn record_id(&self) -> LeagueId {
        self.id
    }
}
