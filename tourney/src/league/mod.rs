//! Round-robin league stages.

pub mod models;

pub use models::League;
