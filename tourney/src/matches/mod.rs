//! Match records and result resolution.

pub mod composite;
pub mod history;
pub mod models;

pub use composite::{Composite, Lineup, SubContest, SubContestKind};
pub use history::{HistoryEntry, MatchOutcome, history_of};
pub use models::{Match, MatchContainer, MatchStatus, RoundTag, StageStatus, resolve_winner};
