//! Bracket and series progression.
//!
//! Each bracket format is a set of pure rules: which rounds exist, what opens
//! the bracket, and what a settled round leads to. The rules never touch
//! storage; they read a [`BracketSnapshot`] and answer with
//! [`BracketAction`]s that the tournament layer turns into records.

use crate::errors::TournamentResult;
use crate::ids::ParticipantId;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

pub mod gauntlet;
pub mod models;
pub mod page_playoff;
pub mod seeding;
pub mod series;
pub mod single_elimination;

pub use gauntlet::Gauntlet;
pub use models::{
    BracketAction, BracketSnapshot, Knockout, KnockoutRound, RoundStage, RoundState, SlotState,
};
pub use page_playoff::{PAGE_PLAYOFF_ENTRANTS, PagePlayoff};
pub use seeding::bracket_order;
pub use series::{Series, SeriesProgress, validate_best_of};
pub use single_elimination::SingleElimination;

/// Progression rules of a bracket format
#[enum_dispatch]
pub trait BracketRules {
    /// Rounds of a bracket for this many entrants, first to last
    fn declare_rounds(&self, entrants: usize) -> TournamentResult<Vec<RoundStage>>;

    /// Entities that open the bracket; `seeds` has already passed `declare_rounds`
    fn opening(&self, seeds: &[ParticipantId]) -> Vec<BracketAction>;

    /// What follows from the current state
    ///
    /// Returns nothing while the latest round is still being played. Rounds
    /// that already exist are never created again.
    fn advance(&self, snapshot: &BracketSnapshot<'_>) -> TournamentResult<Vec<BracketAction>>;
}

/// Supported bracket formats
#[enum_dispatch(BracketRules)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BracketFormat {
    SingleElimination(SingleElimination),
    Gauntlet(Gauntlet),
    PagePlayoff(PagePlayoff),
}
