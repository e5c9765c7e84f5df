use super::BracketRules;
use super::models::{BracketAction, BracketSnapshot, RoundStage};
use crate::errors::{TournamentError, TournamentResult};
use crate::ids::ParticipantId;
use serde::{Deserialize, Serialize};

/// Four-entrant playoff where the top two seeds get a second chance
///
/// - Match A: seed 1 v seed 2
/// - Match B: seed 3 v seed 4
/// - Match C: loser of A v winner of B
/// - Match D: winner of A v winner of C, for the title
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePlayoff;

pub const PAGE_PLAYOFF_ENTRANTS: usize = 4;

impl BracketRules for PagePlayoff {
    fn declare_rounds(&self, entrants: usize) -> TournamentResult<Vec<RoundStage>> {
        if entrants != PAGE_PLAYOFF_ENTRANTS {
            return Err(TournamentError::InvalidBracketSize(entrants));
        }
        Ok(vec![
            RoundStage::PageQualifiers,
            RoundStage::PageSemiFinal,
            RoundStage::PageFinal,
        ])
    }

    fn opening(&self, seeds: &[ParticipantId]) -> Vec<BracketAction> {
        vec![BracketAction::CreateMatches {
            round: 0,
            pairings: vec![(seeds[0], seeds[1]), (seeds[2], seeds[3])],
        }]
    }

    fn advance(&self, snapshot: &BracketSnapshot<'_>) -> TournamentResult<Vec<BracketAction>> {
        let Some((index, results)) = snapshot.settled_frontier() else {
            return Ok(Vec::new());
        };

        let action = match index {
            0 => {
                let [(_, loser_a), (winner_b, _)] = results[..] else {
                    return Err(malformed("qualifiers"));
                };
                BracketAction::CreateMatches {
                    round: 1,
                    pairings: vec![(loser_a, winner_b)],
                }
            }
            1 => {
                let [(winner_a, _), _] = snapshot.results_of(0)?[..] else {
                    return Err(malformed("qualifiers"));
                };
                let [(winner_c, _)] = results[..] else {
                    return Err(malformed("semi final"));
                };
                BracketAction::CreateMatches {
                    round: 2,
                    pairings: vec![(winner_a, winner_c)],
                }
            }
            _ => {
                let [(champion, runner_up)] = results[..] else {
                    return Err(malformed("final"));
                };
                let [(_, loser_c)] = snapshot.results_of(1)?[..] else {
                    return Err(malformed("semi final"));
                };
                let [_, (_, loser_b)] = snapshot.results_of(0)?[..] else {
                    return Err(malformed("qualifiers"));
                };
                BracketAction::Complete {
                    champion,
                    placements: vec![champion, runner_up, loser_c, loser_b],
                }
            }
        };
        Ok(vec![action])
    }
}

fn malformed(round: &str) -> TournamentError {
    TournamentError::DataIntegrity(format!("page playoff {round} has the wrong number of matches"))
}
