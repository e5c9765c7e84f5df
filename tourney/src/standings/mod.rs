//! Standings tables computed from completed matches.

pub mod calculator;

pub use calculator::{DRAW_POINTS, StandingsRow, WIN_POINTS, compute_standings, position_of};
