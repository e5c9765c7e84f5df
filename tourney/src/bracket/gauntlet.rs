use super::BracketRules;
use super::models::{BracketAction, BracketSnapshot, RoundStage};
use super::series::validate_best_of;
use crate::errors::{TournamentError, TournamentResult};
use crate::ids::ParticipantId;
use serde::{Deserialize, Serialize};

/// Ladder of best-of series climbing the seed list
///
/// The two lowest seeds open; each winner then meets the next seed up, and
/// the series against the top seed is the final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gauntlet {
    pub best_of: u32,
}

impl Gauntlet {
    pub fn new(best_of: u32) -> TournamentResult<Self> {
        validate_best_of(best_of)?;
        Ok(Self { best_of })
    }
}

impl BracketRules for Gauntlet {
    fn declare_rounds(&self, entrants: usize) -> TournamentResult<Vec<RoundStage>> {
        if entrants < 2 {
            return Err(TournamentError::InsufficientParticipants {
                needed: 2,
                current: entrants,
            });
        }

        let steps = entrants as u32 - 1;
        let mut stages: Vec<RoundStage> = (1..steps).map(RoundStage::Gauntlet).collect();
        stages.push(RoundStage::GauntletFinal);
        Ok(stages)
    }

    fn opening(&self, seeds: &[ParticipantId]) -> Vec<BracketAction> {
        let n = seeds.len();
        vec![BracketAction::CreateSeries {
            round: 0,
            player1: seeds[n - 1],
            player2: seeds[n - 2],
            best_of: self.best_of,
        }]
    }

    fn advance(&self, snapshot: &BracketSnapshot<'_>) -> TournamentResult<Vec<BracketAction>> {
        let Some((index, results)) = snapshot.settled_frontier() else {
            return Ok(Vec::new());
        };
        let (winner, loser) = results[0];

        if snapshot.is_terminal(index) {
            let mut placements = vec![winner, loser];
            for earlier in (0..index).rev() {
                placements.extend(snapshot.results_of(earlier)?.iter().map(|&(_, lost)| lost));
            }
            return Ok(vec![BracketAction::Complete {
                champion: winner,
                placements,
            }]);
        }

        // Round k (0-based) is against seed index n - 2 - k
        let next = index + 1;
        let opponent = snapshot
            .seeds
            .len()
            .checked_sub(2 + next)
            .and_then(|seed| snapshot.seeds.get(seed))
            .copied()
            .ok_or_else(|| {
                TournamentError::DataIntegrity(format!(
                    "gauntlet round {next} has no seed to face"
                ))
            })?;

        Ok(vec![BracketAction::CreateSeries {
            round: next,
            player1: winner,
            player2: opponent,
            best_of: self.best_of,
        }])
    }
}
