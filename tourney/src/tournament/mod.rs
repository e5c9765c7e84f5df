//! Tournament orchestration.
//!
//! This module ties the stages together:
//! - Tournament creation with a fixed stage topology
//! - Registration, fixture generation and publishing
//! - Match completion with bracket and series advancement
//! - Circuit points and seeding of the later stages
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tourney::db::InMemoryStore;
//! use tourney::fixtures::Legs;
//! use tourney::tournament::{NewTournament, TournamentFormat, TournamentManager};
//! use tourney::EngineConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let manager = TournamentManager::new(Arc::new(InMemoryStore::new()), config.clone());
//!
//!     let tournament = manager
//!         .create_tournament(NewTournament {
//!             name: "Winter Circuit".to_string(),
//!             format: TournamentFormat::champions_circuit(&config),
//!             max_participants: 8,
//!             legs: Legs::Double,
//!         })
//!         .await?;
//!     println!("Created tournament: {}", tournament.id);
//!
//!     Ok(())
//! }
//! ```

mod lifecycle;
pub mod manager;
pub mod models;
mod phases;
mod progression;
mod transition;

pub use manager::TournamentManager;
pub use models::{
    GAUNTLET_ENTRANTS, NewTournament, Progress, ProgressionEvent, StageRef, Tournament,
    TournamentFormat, TournamentStatus, Visibility,
};
