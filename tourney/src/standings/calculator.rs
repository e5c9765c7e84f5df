use crate::ids::ParticipantId;
use crate::matches::Match;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

pub const WIN_POINTS: u32 = 3;
pub const DRAW_POINTS: u32 = 1;

/// One participant's line in a standings table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub participant: ParticipantId,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    pub points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Win,
    Draw,
    Loss,
}

impl StandingsRow {
    pub fn new(participant: ParticipantId) -> Self {
        Self {
            participant,
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
        }
    }

    /// Totals saturate rather than overflow on absurd scores
    fn record(&mut self, scored: u32, conceded: u32, outcome: Outcome) {
        self.played = self.played.saturating_add(1);
        self.goals_for = self.goals_for.saturating_add(scored);
        self.goals_against = self.goals_against.saturating_add(conceded);
        self.goal_difference = i64::from(self.goals_for) - i64::from(self.goals_against);
        match outcome {
            Outcome::Win => {
                self.wins = self.wins.saturating_add(1);
                self.points = self.points.saturating_add(WIN_POINTS);
            }
            Outcome::Draw => {
                self.draws = self.draws.saturating_add(1);
                self.points = self.points.saturating_add(DRAW_POINTS);
            }
            Outcome::Loss => self.losses = self.losses.saturating_add(1),
        }
    }
}

/// Rank participants by their completed matches
///
/// Every participant gets a row, including those with no completed match.
/// Matches that are not completed or involve anyone outside `participants`
/// are ignored. Rows are ordered by points, then goal difference, then goals
/// scored; remaining ties keep the order of `participants`.
pub fn compute_standings(participants: &[ParticipantId], matches: &[Match]) -> Vec<StandingsRow> {
    let mut rows: Vec<StandingsRow> = Vec::with_capacity(participants.len());
    let mut index: HashMap<ParticipantId, usize> = HashMap::with_capacity(participants.len());
    for &participant in participants {
        index.entry(participant).or_insert_with(|| {
            rows.push(StandingsRow::new(participant));
            rows.len() - 1
        });
    }

    for game in matches.iter().filter(|game| game.is_completed()) {
        let (Some(&a), Some(&b)) = (index.get(&game.side_a), index.get(&game.side_b)) else {
            continue;
        };
        if a == b {
            continue;
        }

        let (outcome_a, outcome_b) = match game.winner {
            None => (Outcome::Draw, Outcome::Draw),
            Some(winner) if winner == game.side_a => (Outcome::Win, Outcome::Loss),
            Some(winner) if winner == game.side_b => (Outcome::Loss, Outcome::Win),
            Some(winner) => {
                log::warn!(
                    "Match {} names {winner} as winner but is played by {} and {}; skipping",
                    game.id,
                    game.side_a,
                    game.side_b
                );
                continue;
            }
        };

        let (goals_a, goals_b) = game.goals();
        rows[a].record(goals_a, goals_b, outcome_a);
        rows[b].record(goals_b, goals_a, outcome_b);
    }

    rows.sort_by_key(|row| {
        (
            Reverse(row.points),
            Reverse(row.goal_difference),
            Reverse(row.goals_for),
        )
    });
    rows
}

/// Zero-based position of a participant in a table
pub fn position_of(rows: &[StandingsRow], participant: ParticipantId) -> Option<usize> {
    rows.iter().position(|row| row.participant == participant)
}
