use super::BracketRules;
use super::models::{BracketAction, BracketSnapshot, RoundStage};
use super::seeding::bracket_order;
use crate::errors::{TournamentError, TournamentResult};
use crate::ids::ParticipantId;
use serde::{Deserialize, Serialize};

/// Straight knockout over a power-of-two field
///
/// Round one follows the standard seed order; every later match is played by
/// the winners of two adjacent slots of the previous round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleElimination;

impl BracketRules for SingleElimination {
    fn declare_rounds(&self, entrants: usize) -> TournamentResult<Vec<RoundStage>> {
        if entrants < 2 || !entrants.is_power_of_two() {
            return Err(TournamentError::InvalidBracketSize(entrants));
        }

        let mut stages = Vec::new();
        let mut remaining = entrants as u32;
        while remaining >= 2 {
            stages.push(RoundStage::Elimination(remaining));
            remaining /= 2;
        }
        Ok(stages)
    }

    fn opening(&self, seeds: &[ParticipantId]) -> Vec<BracketAction> {
        let slots: Vec<ParticipantId> = bracket_order(seeds.len())
            .into_iter()
            .map(|seed| seeds[seed - 1])
            .collect();

        vec![BracketAction::CreateMatches {
            round: 0,
            pairings: slots.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect(),
        }]
    }

    fn advance(&self, snapshot: &BracketSnapshot<'_>) -> TournamentResult<Vec<BracketAction>> {
        let Some((index, results)) = snapshot.settled_frontier() else {
            return Ok(Vec::new());
        };

        if snapshot.is_terminal(index) {
            let (champion, runner_up) = results[0];
            let mut placements = vec![champion, runner_up];
            for earlier in (0..index).rev() {
                placements.extend(snapshot.results_of(earlier)?.iter().map(|&(_, loser)| loser));
            }
            return Ok(vec![BracketAction::Complete {
                champion,
                placements,
            }]);
        }

        Ok(vec![BracketAction::CreateMatches {
            round: index + 1,
            pairings: results
                .chunks_exact(2)
                .map(|pair| (pair[0].0, pair[1].0))
                .collect(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::models::{RoundState, SlotState};

    fn p(n: i64) -> ParticipantId {
        ParticipantId(n)
    }

    fn decided(winner: i64, loser: i64) -> SlotState {
        SlotState::Decided {
            winner: p(winner),
            loser: p(loser),
        }
    }

    #[test]
    fn test_declares_every_round() {
        let stages = SingleElimination.declare_rounds(8).unwrap();
        assert_eq!(
            stages,
            vec![
                RoundStage::Elimination(8),
                RoundStage::Elimination(4),
                RoundStage::Elimination(2)
            ]
        );
        assert!(matches!(
            SingleElimination.declare_rounds(6),
            Err(TournamentError::InvalidBracketSize(6))
        ));
        assert!(SingleElimination.declare_rounds(1).is_err());
    }

    #[test]
    fn test_size_eight_opening() {
        let seeds: Vec<_> = (1..=8).map(p).collect();
        let actions = SingleElimination.opening(&seeds);
        assert_eq!(
            actions,
            vec![BracketAction::CreateMatches {
                round: 0,
                pairings: vec![(p(1), p(8)), (p(4), p(5)), (p(2), p(7)), (p(3), p(6))],
            }]
        );
    }

    #[test]
    fn test_winners_paired_by_slot_not_by_seed() {
        let seeds: Vec<_> = (1..=8).map(p).collect();
        let snapshot = BracketSnapshot {
            seeds: &seeds,
            rounds: vec![
                RoundState {
                    stage: RoundStage::Elimination(8),
                    slots: vec![decided(8, 1), decided(4, 5), decided(7, 2), decided(3, 6)],
                },
                RoundState {
                    stage: RoundStage::Elimination(4),
                    slots: vec![],
                },
                RoundState {
                    stage: RoundStage::Elimination(2),
                    slots: vec![],
                },
            ],
        };

        assert_eq!(
            SingleElimination.advance(&snapshot).unwrap(),
            vec![BracketAction::CreateMatches {
                round: 1,
                pairings: vec![(p(8), p(4)), (p(7), p(3))],
            }]
        );
    }

    #[test]
    fn test_final_completes_with_placements() {
        let seeds: Vec<_> = (1..=4).map(p).collect();
        let snapshot = BracketSnapshot {
            seeds: &seeds,
            rounds: vec![
                RoundState {
                    stage: RoundStage::Elimination(4),
                    slots: vec![decided(1, 4), decided(3, 2)],
                },
                RoundState {
                    stage: RoundStage::Elimination(2),
                    slots: vec![decided(3, 1)],
                },
            ],
        };

        assert_eq!(
            SingleElimination.advance(&snapshot).unwrap(),
            vec![BracketAction::Complete {
                champion: p(3),
                placements: vec![p(3), p(1), p(4), p(2)],
            }]
        );
    }

    #[test]
    fn test_waits_while_round_open() {
        let seeds: Vec<_> = (1..=4).map(p).collect();
        let snapshot = BracketSnapshot {
            seeds: &seeds,
            rounds: vec![
                RoundState {
                    stage: RoundStage::Elimination(4),
                    slots: vec![decided(1, 4), SlotState::Pending],
                },
                RoundState {
                    stage: RoundStage::Elimination(2),
                    slots: vec![],
                },
            ],
        };
        assert!(SingleElimination.advance(&snapshot).unwrap().is_empty());
    }
}
