//! Circuit points and final seeding.
//!
//! Both scoring phases share one [`PlacementPoints`] table: phase 1 scores the
//! league finishing order and phase 2 the gauntlet placements. A participant's
//! total is always derived from the two phase figures.

pub mod models;
pub mod seeding;
pub mod table;

pub use models::{Phase, PointsRecord, SeedingEntry};
pub use seeding::final_seeding;
pub use table::PlacementPoints;
