//! Per-participant match history derived from container match lists.

use super::models::{Match, MatchContainer, RoundTag};
use crate::ids::{MatchId, ParticipantId, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a match went for one participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    Pending,
    Win,
    Draw,
    Loss,
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            MatchOutcome::Pending => "Pending",
            MatchOutcome::Win => "W",
            MatchOutcome::Draw => "D",
            MatchOutcome::Loss => "L",
        };
        f.write_str(code)
    }
}

/// One fixture seen from a participant's side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub match_id: MatchId,
    pub opponent: ParticipantId,
    pub label: String,
    pub round: RoundTag,
    pub container: MatchContainer,
    pub outcome: MatchOutcome,
    /// `(scored, conceded)` once the match is completed
    pub score: Option<(u32, u32)>,
}

/// Every match of `participant` in the given order, pending ones included
pub fn history_of(participant: ParticipantId, matches: &[Match]) -> Vec<HistoryEntry> {
    matches
        .iter()
        .filter_map(|game| {
            let side = game.side_of(participant)?;
            let opponent = game.participant(side.opposite());

            let (outcome, score) = if game.is_completed() {
                let (own, other) = match side {
                    Side::A => (game.score_a, game.score_b),
                    Side::B => (game.score_b, game.score_a),
                };
                let outcome = match game.winner {
                    None => MatchOutcome::Draw,
                    Some(winner) if winner == participant => MatchOutcome::Win,
                    Some(_) => MatchOutcome::Loss,
                };
                (outcome, Some((own, other)))
            } else {
                (MatchOutcome::Pending, None)
            };

            Some(HistoryEntry {
                match_id: game.id,
                opponent,
                label: game.label.clone(),
                round: game.round,
                container: game.container,
                outcome,
                score,
            })
        })
        .collect()
}
