use crate::db::{Record, RecordKind};
use crate::ids::{ParticipantId, TournamentId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Scoring phase of a points circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// League standings
    One,
    /// Gauntlet placement
    Two,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::One => f.write_str("phase 1"),
            Phase::Two => f.write_str("phase 2"),
        }
    }
}

/// A participant's circuit points in one tournament
///
/// There is one record per tournament and participant; its id is derived from
/// both, so repeated upserts always land on the same record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsRecord {
    pub id: Uuid,
    pub tournament: TournamentId,
    pub participant: ParticipantId,
    pub phase1_points: Option<u32>,
    pub phase2_points: Option<u32>,
}

impl PointsRecord {
    pub fn new(tournament: TournamentId, participant: ParticipantId) -> Self {
        Self {
            id: Self::id_for(tournament, participant),
            tournament,
            participant,
            phase1_points: None,
            phase2_points: None,
        }
    }

    pub fn id_for(tournament: TournamentId, participant: ParticipantId) -> Uuid {
        Uuid::new_v5(&tournament.0, &participant.0.to_be_bytes())
    }

    pub fn set(&mut self, phase: Phase, points: u32) {
        match phase {
            Phase::One => self.phase1_points = Some(points),
            Phase::Two => self.phase2_points = Some(points),
        }
    }

    /// Sum of both phases, or `None` while either is missing
    pub fn total_points(&self) -> Option<u32> {
        Some(self.phase1_points? + self.phase2_points?)
    }
}

impl Record for PointsRecord {
    const KIND: RecordKind = RecordKind::Points;
    type Id = Uuid;

    fn record_id(&self) -> Uuid {
        self.id
    }
}

/// One line of a final seeding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedingEntry {
    pub participant: ParticipantId,
    pub phase1_points: u32,
    pub phase2_points: u32,
    pub total_points: u32,
    /// Zero-based position in the phase 1 standings
    pub phase1_position: usize,
}
