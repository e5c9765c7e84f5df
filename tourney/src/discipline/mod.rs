//! Player discipline: cards, bans and the action log.
//!
//! A yellow card stays active for a configurable number of days and a second
//! active yellow turns into a ban. Red cards ban immediately. Orange cards
//! mark the participant on a single match and nothing else.

pub mod manager;
pub mod models;

pub use manager::{DisciplineError, DisciplineManager, DisciplineResult};
pub use models::{
    ActionKind, Card, CardOutcome, CardRequest, DisciplinaryAction, DisciplinePolicy,
    DisciplineRecord, DisciplineStatus, YellowCard,
};
