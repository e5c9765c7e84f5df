use super::BracketFormat;
use super::BracketRules;
use super::series::Series;
use crate::db::{Record, RecordKind};
use crate::errors::{TournamentError, TournamentResult};
use crate::ids::{KnockoutId, MatchId, ParticipantId, SeriesId, TournamentId};
use crate::matches::{Match, StageStatus};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Position of a round within a bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundStage {
    /// Straight knockout round with this many entrants
    Elimination(u32),
    /// Gauntlet step before the final, 1-indexed
    Gauntlet(u32),
    GauntletFinal,
    /// Page playoff matches A and B
    PageQualifiers,
    /// Page playoff match C
    PageSemiFinal,
    /// Page playoff match D
    PageFinal,
}

impl RoundStage {
    pub fn name(self) -> String {
        match self {
            RoundStage::Elimination(2) => "Final".to_string(),
            RoundStage::Elimination(4) => "Semi Finals".to_string(),
            RoundStage::Elimination(8) => "Quarter Finals".to_string(),
            RoundStage::Elimination(entrants) => format!("Round of {entrants}"),
            RoundStage::Gauntlet(step) => format!("Gauntlet Round {step}"),
            RoundStage::GauntletFinal => "Gauntlet Final".to_string(),
            RoundStage::PageQualifiers => "Page Qualifiers".to_string(),
            RoundStage::PageSemiFinal => "Page Semi Final".to_string(),
            RoundStage::PageFinal => "Page Final".to_string(),
        }
    }

    /// Display label of the match or series in a slot of this round
    pub fn match_label(self, slot: u32) -> String {
        let number = slot + 1;
        match self {
            RoundStage::Elimination(2) => "Final".to_string(),
            RoundStage::Elimination(4) => format!("Semi Final {number}"),
            RoundStage::Elimination(8) => format!("Quarter Final {number}"),
            RoundStage::Elimination(entrants) => format!("Round of {entrants} Match {number}"),
            RoundStage::PageQualifiers if slot == 0 => "Match A".to_string(),
            RoundStage::PageQualifiers => "Match B".to_string(),
            RoundStage::PageSemiFinal => "Match C".to_string(),
            RoundStage::PageFinal => "Match D".to_string(),
            RoundStage::Gauntlet(_) | RoundStage::GauntletFinal => self.name(),
        }
    }
}

/// A round of a knockout; empty until the bracket reaches it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnockoutRound {
    pub stage: RoundStage,
    pub name: String,
    pub matches: Vec<MatchId>,
    pub series: Vec<SeriesId>,
}

impl KnockoutRound {
    pub fn placeholder(stage: RoundStage) -> Self {
        Self {
            stage,
            name: stage.name(),
            matches: Vec::new(),
            series: Vec::new(),
        }
    }

    pub fn is_populated(&self) -> bool {
        !self.matches.is_empty() || !self.series.is_empty()
    }
}

/// A bracket stage of a tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knockout {
    pub id: KnockoutId,
    pub tournament: TournamentId,
    pub name: String,
    /// Entrants in seed order, best first
    pub seeds: Vec<ParticipantId>,
    pub format: BracketFormat,
    pub rounds: Vec<KnockoutRound>,
    pub status: StageStatus,
    pub champion: Option<ParticipantId>,
    /// Final placements, champion first; empty until completed
    pub placements: Vec<ParticipantId>,
}

impl Knockout {
    /// Create a knockout with every round declared but empty
    pub fn new(
        tournament: TournamentId,
        name: impl Into<String>,
        format: BracketFormat,
        seeds: Vec<ParticipantId>,
    ) -> TournamentResult<Self> {
        let mut seen = HashSet::with_capacity(seeds.len());
        if let Some(&duplicate) = seeds.iter().find(|&&p| !seen.insert(p)) {
            return Err(TournamentError::DuplicateParticipant(duplicate));
        }

        let rounds = format
            .declare_rounds(seeds.len())?
            .into_iter()
            .map(KnockoutRound::placeholder)
            .collect();

        Ok(Self {
            id: KnockoutId::new(),
            tournament,
            name: name.into(),
            seeds,
            format,
            rounds,
            status: StageStatus::Upcoming,
            champion: None,
            placements: Vec::new(),
        })
    }

    pub fn round_index(&self, stage: RoundStage) -> Option<usize> {
        self.rounds.iter().position(|round| round.stage == stage)
    }

    pub fn match_ids(&self) -> Vec<MatchId> {
        self.rounds
            .iter()
            .flat_map(|round| round.matches.iter().copied())
            .collect()
    }

    pub fn series_ids(&self) -> Vec<SeriesId> {
        self.rounds
            .iter()
            .flat_map(|round| round.series.iter().copied())
            .collect()
    }

    /// Reduce the bracket to who won and lost each slot
    ///
    /// `matches` and `series` must hold every entity the rounds reference.
    pub fn snapshot(
        &self,
        matches: &HashMap<MatchId, Match>,
        series: &HashMap<SeriesId, Series>,
    ) -> TournamentResult<BracketSnapshot<'_>> {
        let rounds = self
            .rounds
            .iter()
            .map(|round| -> TournamentResult<RoundState> {
                let from_matches = round.matches.iter().map(|id| -> TournamentResult<SlotState> {
                    let game = matches.get(id).ok_or_else(|| missing(self.id, "match", id))?;
                    slot_from_match(game)
                });
                let from_series = round.series.iter().map(|id| -> TournamentResult<SlotState> {
                    let set = series.get(id).ok_or_else(|| missing(self.id, "series", id))?;
                    Ok(match (set.winner, set.loser()) {
                        (Some(winner), Some(loser)) => SlotState::Decided { winner, loser },
                        _ => SlotState::Pending,
                    })
                });

                Ok(RoundState {
                    stage: round.stage,
                    slots: from_matches
                        .chain(from_series)
                        .collect::<TournamentResult<Vec<_>>>()?,
                })
            })
            .collect::<TournamentResult<Vec<_>>>()?;

        Ok(BracketSnapshot {
            seeds: &self.seeds,
            rounds,
        })
    }
}

impl Record for Knockout {
    const KIND: RecordKind = RecordKind::Knockout;
    type Id = KnockoutId;

    fn record_id(&self) -> KnockoutId {
        self.id
    }
}

fn missing(knockout: KnockoutId, what: &str, id: &impl std::fmt::Display) -> TournamentError {
    TournamentError::DataIntegrity(format!("knockout {knockout} references unknown {what} {id}"))
}

fn slot_from_match(game: &Match) -> TournamentResult<SlotState> {
    if !game.is_completed() {
        return Ok(SlotState::Pending);
    }
    match (game.winner, game.loser()) {
        (Some(winner), Some(loser)) => Ok(SlotState::Decided { winner, loser }),
        _ => Err(TournamentError::DataIntegrity(format!(
            "knockout match {} completed without a winner",
            game.id
        ))),
    }
}

/// Outcome of one bracket slot (a match or a whole series)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Pending,
    Decided {
        winner: ParticipantId,
        loser: ParticipantId,
    },
}

impl SlotState {
    pub fn decided(&self) -> Option<(ParticipantId, ParticipantId)> {
        match *self {
            SlotState::Decided { winner, loser } => Some((winner, loser)),
            SlotState::Pending => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub stage: RoundStage,
    /// Empty when the round has not been created yet
    pub slots: Vec<SlotState>,
}

impl RoundState {
    /// `(winner, loser)` per slot once every slot is decided
    pub fn results(&self) -> Option<Vec<(ParticipantId, ParticipantId)>> {
        if self.slots.is_empty() {
            return None;
        }
        self.slots.iter().map(SlotState::decided).collect()
    }
}

/// Read-only view of a bracket used to decide what happens next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketSnapshot<'a> {
    pub seeds: &'a [ParticipantId],
    pub rounds: Vec<RoundState>,
}

impl BracketSnapshot<'_> {
    /// Latest created round and its results, once all of it is decided
    pub fn settled_frontier(&self) -> Option<(usize, Vec<(ParticipantId, ParticipantId)>)> {
        let index = self
            .rounds
            .iter()
            .rposition(|round| !round.slots.is_empty())?;
        self.rounds[index].results().map(|results| (index, results))
    }

    pub fn is_terminal(&self, index: usize) -> bool {
        index + 1 == self.rounds.len()
    }

    /// Results of an earlier round that must already be settled
    pub fn results_of(&self, index: usize) -> TournamentResult<Vec<(ParticipantId, ParticipantId)>> {
        self.rounds
            .get(index)
            .and_then(RoundState::results)
            .ok_or_else(|| {
                TournamentError::DataIntegrity(format!(
                    "bracket round {index} is not settled but a later round is"
                ))
            })
    }
}

/// Entity creation or completion decided by a bracket's rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BracketAction {
    /// Create single matches in round `round`, one per pairing, in slot order
    CreateMatches {
        round: usize,
        pairings: Vec<(ParticipantId, ParticipantId)>,
    },
    /// Create a best-of series in round `round`
    CreateSeries {
        round: usize,
        player1: ParticipantId,
        player2: ParticipantId,
        best_of: u32,
    },
    /// The bracket is finished
    Complete {
        champion: ParticipantId,
        placements: Vec<ParticipantId>,
    },
}
