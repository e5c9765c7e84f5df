//! Tournament data models.

use crate::bracket::{PAGE_PLAYOFF_ENTRANTS, RoundStage, validate_best_of};
use crate::config::EngineConfig;
use crate::db::{Record, RecordKind};
use crate::errors::{TournamentError, TournamentResult};
use crate::fixtures::Legs;
use crate::ids::{KnockoutId, LeagueId, MatchId, ParticipantId, SeriesId, Side, TournamentId};
use crate::matches::SubContestKind;
use crate::points::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of league finishers that enter the gauntlet
pub const GAUNTLET_ENTRANTS: usize = 4;

/// Stage topology, fixed when the tournament is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentFormat {
    /// The league winner is champion
    LeagueOnly,
    /// League, then a single-elimination bracket of the top finishers
    LeagueKnockout { bracket_size: usize },
    /// League, then a gauntlet of best-of series, then a page playoff seeded
    /// by combined circuit points
    ChampionsCircuit { gauntlet_best_of: u32 },
}

impl TournamentFormat {
    /// Champions circuit with the configured gauntlet series length
    pub fn champions_circuit(config: &EngineConfig) -> Self {
        TournamentFormat::ChampionsCircuit {
            gauntlet_best_of: config.series_best_of,
        }
    }

    /// Smallest league that can feed this format's later stages
    pub fn min_participants(&self) -> usize {
        match *self {
            TournamentFormat::LeagueOnly => 2,
            TournamentFormat::LeagueKnockout { bracket_size } => bracket_size.max(2),
            TournamentFormat::ChampionsCircuit { .. } => {
                GAUNTLET_ENTRANTS.max(PAGE_PLAYOFF_ENTRANTS)
            }
        }
    }

    /// Check the format's own settings against the league size
    pub fn validate(&self, max_participants: usize) -> TournamentResult<()> {
        match *self {
            TournamentFormat::LeagueOnly => {}
            TournamentFormat::LeagueKnockout { bracket_size } => {
                if bracket_size < 2 || !bracket_size.is_power_of_two() {
                    return Err(TournamentError::InvalidBracketSize(bracket_size));
                }
            }
            TournamentFormat::ChampionsCircuit { gauntlet_best_of } => {
                validate_best_of(gauntlet_best_of)?;
            }
        }

        let needed = self.min_participants();
        if max_participants < needed {
            return Err(TournamentError::InsufficientParticipants {
                needed,
                current: max_participants,
            });
        }
        Ok(())
    }
}

/// Tournament progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TournamentStatus {
    /// Registration open, no fixtures yet
    Upcoming,
    /// Fixtures generated
    Live,
    /// Champion decided
    Completed,
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TournamentStatus::Upcoming => "Upcoming",
            TournamentStatus::Live => "Live",
            TournamentStatus::Completed => "Completed",
        };
        f.write_str(name)
    }
}

/// Whether the tournament is listed publicly; independent of progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Published,
    Unpublished,
}

/// Reference to a tournament stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageRef {
    League(LeagueId),
    Knockout(KnockoutId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub format: TournamentFormat,
    /// Stages in play order; later stages are appended once seeded
    pub stages: Vec<StageRef>,
    pub status: TournamentStatus,
    pub visibility: Visibility,
    pub champion: Option<ParticipantId>,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    pub fn new(name: impl Into<String>, format: TournamentFormat) -> Self {
        Self {
            id: TournamentId::new(),
            name: name.into(),
            format,
            stages: Vec::new(),
            status: TournamentStatus::Upcoming,
            visibility: Visibility::Unpublished,
            champion: None,
            created_at: Utc::now(),
        }
    }

    /// The opening league stage
    pub fn league(&self) -> Option<LeagueId> {
        self.stages.iter().find_map(|stage| match stage {
            StageRef::League(id) => Some(*id),
            StageRef::Knockout(_) => None,
        })
    }

    /// Knockout stages in play order
    pub fn knockouts(&self) -> Vec<KnockoutId> {
        self.stages
            .iter()
            .filter_map(|stage| match stage {
                StageRef::Knockout(id) => Some(*id),
                StageRef::League(_) => None,
            })
            .collect()
    }
}

impl Record for Tournament {
    const KIND: RecordKind = RecordKind::Tournament;
    type Id = TournamentId;

    fn record_id(&self) -> TournamentId {
        self.id
    }
}

/// Tournament creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTournament {
    pub name: String,
    pub format: TournamentFormat,
    pub max_participants: usize,
    pub legs: Legs,
}

/// Something that happened during an applied operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressionEvent {
    ParticipantRegistered {
        league: LeagueId,
        participant: ParticipantId,
    },
    FixturesGenerated {
        league: LeagueId,
        matches: usize,
        rounds: u32,
    },
    MatchesPublished {
        matches: Vec<MatchId>,
    },
    SeriesActivated {
        series: SeriesId,
    },
    VisibilityChanged {
        tournament: TournamentId,
        visibility: Visibility,
    },
    LineupSubmitted {
        match_id: MatchId,
        side: Side,
        sub_contests_ready: bool,
    },
    SubContestRecorded {
        match_id: MatchId,
        kind: SubContestKind,
        winner: Option<ParticipantId>,
    },
    MatchCompleted {
        match_id: MatchId,
        winner: Option<ParticipantId>,
    },
    SeriesGameScheduled {
        series: SeriesId,
        match_id: MatchId,
        game: u32,
    },
    SeriesCompleted {
        series: SeriesId,
        winner: ParticipantId,
    },
    RoundCreated {
        knockout: KnockoutId,
        stage: RoundStage,
        matches: Vec<MatchId>,
    },
    SeriesCreated {
        knockout: KnockoutId,
        stage: RoundStage,
        series: SeriesId,
    },
    LeagueCompleted {
        league: LeagueId,
    },
    StandingsRefreshed {
        league: LeagueId,
    },
    PointsAwarded {
        tournament: TournamentId,
        phase: Phase,
        participants: usize,
    },
    StageSeeded {
        tournament: TournamentId,
        knockout: KnockoutId,
        seeds: Vec<ParticipantId>,
    },
    KnockoutCompleted {
        knockout: KnockoutId,
        champion: ParticipantId,
    },
    TournamentCompleted {
        tournament: TournamentId,
        champion: ParticipantId,
    },
}

/// Outcome of a state-changing operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The operation changed state
    Applied(Vec<ProgressionEvent>),
    /// The same change had already been made; nothing was written
    AlreadyApplied,
}

impl Progress {
    pub fn is_applied(&self) -> bool {
        matches!(self, Progress::Applied(_))
    }

    pub fn events(&self) -> &[ProgressionEvent] {
        match self {
            Progress::Applied(events) => events,
            Progress::AlreadyApplied => &[],
        }
    }
}
