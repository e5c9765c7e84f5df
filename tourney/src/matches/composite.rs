//! Squad matches decided by individual sub-contests.
//!
//! Each side names a lineup of three players. Once both lineups are in, one
//! sub-contest per lineup slot is created. Sub-contests score 3/1/0 like a
//! league match and those points become the parent match score, while the
//! raw sub-contest scores count as the parent's goals.

use super::models::resolve_winner;
use crate::errors::{TournamentError, TournamentResult};
use crate::ids::{MatchId, ParticipantId, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lineup slot a sub-contest is played for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubContestKind {
    StarPlayer,
    FirstDayPlayer,
    LateNightPlayer,
}

impl SubContestKind {
    pub const ALL: [SubContestKind; 3] = [
        SubContestKind::StarPlayer,
        SubContestKind::FirstDayPlayer,
        SubContestKind::LateNightPlayer,
    ];
}

impl fmt::Display for SubContestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubContestKind::StarPlayer => "Star Player",
            SubContestKind::FirstDayPlayer => "First Day Player",
            SubContestKind::LateNightPlayer => "Late Night Player",
        };
        f.write_str(label)
    }
}

/// Players a side fields for a squad match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineup {
    pub star: ParticipantId,
    pub first_day: ParticipantId,
    pub late_night: ParticipantId,
}

impl Lineup {
    pub fn player(&self, kind: SubContestKind) -> ParticipantId {
        match kind {
            SubContestKind::StarPlayer => self.star,
            SubContestKind::FirstDayPlayer => self.first_day,
            SubContestKind::LateNightPlayer => self.late_night,
        }
    }

    pub fn players(&self) -> [ParticipantId; 3] {
        [self.star, self.first_day, self.late_night]
    }

    /// First player fielded by both lineups
    pub fn shared_with(&self, other: &Lineup) -> Option<ParticipantId> {
        self.players()
            .into_iter()
            .find(|player| other.players().contains(player))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubContest {
    pub kind: SubContestKind,
    pub player_a: ParticipantId,
    pub player_b: ParticipantId,
    pub score_a: u32,
    pub score_b: u32,
    pub winner: Option<ParticipantId>,
    /// Side credited with the win; `None` on a draw
    #[serde(default)]
    pub winning_side: Option<Side>,
    pub completed: bool,
}

impl SubContest {
    /// 3/1/0 points for each side; nothing until completed
    pub fn points(&self) -> (u32, u32) {
        if !self.completed {
            return (0, 0);
        }
        match self.winning_side {
            Some(Side::A) => (3, 0),
            Some(Side::B) => (0, 3),
            None => (1, 1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composite {
    pub lineup_a: Option<Lineup>,
    pub lineup_b: Option<Lineup>,
    pub sub_contests: Vec<SubContest>,
}

impl Composite {
    /// Set one side's lineup
    ///
    /// Returns `true` when both lineups are present and the sub-contests were
    /// (re)generated. Lineups are frozen once any sub-contest has a result,
    /// and no player may appear for both sides.
    pub fn set_lineup(&mut self, side: Side, lineup: Lineup) -> TournamentResult<bool> {
        if self.sub_contests.iter().any(|contest| contest.completed) {
            return Err(TournamentError::InvalidState {
                entity: "squad match",
                expected: "no sub-contest results".to_string(),
                actual: "results recorded".to_string(),
            });
        }

        let other = match side {
            Side::A => self.lineup_b,
            Side::B => self.lineup_a,
        };
        if let Some(player) = other.and_then(|other| lineup.shared_with(&other)) {
            return Err(TournamentError::LineupConflict(player));
        }

        match side {
            Side::A => self.lineup_a = Some(lineup),
            Side::B => self.lineup_b = Some(lineup),
        }

        let (Some(lineup_a), Some(lineup_b)) = (self.lineup_a, self.lineup_b) else {
            return Ok(false);
        };

        self.sub_contests = SubContestKind::ALL
            .into_iter()
            .map(|kind| SubContest {
                kind,
                player_a: lineup_a.player(kind),
                player_b: lineup_b.player(kind),
                score_a: 0,
                score_b: 0,
                winner: None,
                winning_side: None,
                completed: false,
            })
            .collect();
        Ok(true)
    }

    /// Record the result of one sub-contest
    pub fn record(
        &mut self,
        match_id: MatchId,
        kind: SubContestKind,
        (score_a, score_b): (u32, u32),
        allows_draw: bool,
        tie_break: Option<ParticipantId>,
    ) -> TournamentResult<Option<ParticipantId>> {
        let contest = self
            .sub_contests
            .iter_mut()
            .find(|contest| contest.kind == kind)
            .ok_or_else(|| TournamentError::InvalidState {
                entity: "squad match",
                expected: "both lineups submitted".to_string(),
                actual: "lineups pending".to_string(),
            })?;

        if contest.completed {
            return Err(TournamentError::InvalidState {
                entity: "sub-contest",
                expected: "open".to_string(),
                actual: "Completed".to_string(),
            });
        }

        let winner = resolve_winner(
            match_id,
            (contest.player_a, contest.player_b),
            (score_a, score_b),
            allows_draw,
            tie_break,
        )?;

        contest.score_a = score_a;
        contest.score_b = score_b;
        contest.winner = winner;
        contest.winning_side = winner.map(|winner| {
            if score_a > score_b || (score_a == score_b && winner == contest.player_a) {
                Side::A
            } else {
                Side::B
            }
        });
        contest.completed = true;
        Ok(winner)
    }

    /// Sum of sub-contest points per side
    pub fn points(&self) -> (u32, u32) {
        self.sub_contests
            .iter()
            .map(SubContest::points)
            .fold((0, 0), |(a, b), (x, y)| (a + x, b + y))
    }

    /// Sum of raw sub-contest scores per side
    pub fn goals(&self) -> (u32, u32) {
        self.sub_contests
            .iter()
            .filter(|contest| contest.completed)
            .fold((0u32, 0u32), |(a, b), contest| {
                (a.saturating_add(contest.score_a), b.saturating_add(contest.score_b))
            })
    }

    pub fn is_complete(&self) -> bool {
        !self.sub_contests.is_empty() && self.sub_contests.iter().all(|contest| contest.completed)
    }
}
