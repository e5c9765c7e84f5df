//! # Tourney
//!
//! A tournament progression engine for league, knockout and circuit
//! competitions.
//!
//! The engine generates round-robin fixtures, keeps standings, advances
//! brackets and best-of series as results arrive, and carries circuit points
//! from one phase into the seeding of the next. All state lives in a
//! versioned record store and every state change is committed atomically
//! with optimistic version checks, so concurrent result submissions never
//! skip or duplicate a stage.
//!
//! ## Formats
//!
//! - **League only**: the league winner is champion
//! - **League + knockout**: the top finishers play a single-elimination bracket
//! - **Champions circuit**: league, then a gauntlet of best-of series, then a
//!   page playoff seeded by combined points
//!
//! ## Core Modules
//!
//! - [`tournament`]: the [`TournamentManager`] entry points and stage sequencing
//! - [`fixtures`] and [`standings`]: pure schedule and table computation
//! - [`bracket`]: knockout formats, series and bracket advancement rules
//! - [`points`]: placement points and final seeding
//! - [`discipline`]: cards and bans
//! - [`db`]: record stores (in-memory and PostgreSQL)
//!
//! ## Example
//!
//! ```
//! use tourney::fixtures::{Legs, round_robin};
//! use tourney::ParticipantId;
//!
//! let teams: Vec<_> = (1..=4).map(ParticipantId).collect();
//! let pairings = round_robin(&teams, Legs::Single).unwrap();
//! assert_eq!(pairings.len(), 6);
//! ```

pub mod bracket;
pub mod config;
pub mod db;
pub mod discipline;
pub mod errors;
pub mod fixtures;
pub mod ids;
pub mod league;
pub mod matches;
pub mod points;
pub mod standings;
pub mod tournament;

pub use config::{ConfigError, EngineConfig};
pub use db::{InMemoryStore, PgRecordStore, RecordStore};
pub use discipline::{DisciplineError, DisciplineManager};
pub use errors::{ErrorClass, TournamentError, TournamentResult};
pub use ids::{KnockoutId, LeagueId, MatchId, ParticipantId, SeriesId, Side, TournamentId};
pub use tournament::{
    NewTournament, Progress, ProgressionEvent, TournamentFormat, TournamentManager,
};
