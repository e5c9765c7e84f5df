//! Round-robin fixture generation.

pub mod round_robin;

pub use round_robin::{Legs, Pairing, round_robin};
