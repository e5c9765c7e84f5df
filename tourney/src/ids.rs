//! Identifier types shared by every record in the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque participant identity (a solo player or a team).
///
/// The engine never looks inside a participant; it only compares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub i64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "participant#{}", self.0)
    }
}

impl From<i64> for ParticipantId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

record_id!(
    /// Tournament identifier
    TournamentId
);
record_id!(
    /// League (round-robin stage) identifier
    LeagueId
);
record_id!(
    /// Knockout stage identifier
    KnockoutId
);
record_id!(
    /// Best-of-N series identifier
    SeriesId
);
record_id!(
    /// Match identifier
    MatchId
);
record_id!(
    /// Disciplinary action log identifier
    ActionId
);

/// Either side of a two-sided fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ids_are_unique() {
        let a = MatchId::new();
        let b = MatchId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_participant_display() {
        assert_eq!(ParticipantId(42).to_string(), "participant#42");
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::A.opposite(), Side::B);
        assert_eq!(Side::B.opposite(), Side::A);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = LeagueId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
        assert_eq!(serde_json::to_string(&ParticipantId(7)).unwrap(), "7");
    }
}
