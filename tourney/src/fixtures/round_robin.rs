use crate::errors::{TournamentError, TournamentResult};
use crate::ids::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How many times every pair meets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Legs {
    Single,
    /// Second pass with sides swapped
    Double,
    /// Second pass swapped, third pass with the first pass's sides
    Triple,
}

impl Legs {
    pub fn count(self) -> u32 {
        match self {
            Legs::Single => 1,
            Legs::Double => 2,
            Legs::Triple => 3,
        }
    }
}

impl TryFrom<u8> for Legs {
    type Error = TournamentError;

    fn try_from(value: u8) -> TournamentResult<Self> {
        match value {
            1 => Ok(Legs::Single),
            2 => Ok(Legs::Double),
            3 => Ok(Legs::Triple),
            other => Err(TournamentError::UnsupportedLegs(other)),
        }
    }
}

/// A scheduled meeting of two participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pairing {
    pub round: u32,
    pub side_a: ParticipantId,
    pub side_b: ParticipantId,
}

/// Generate a round-robin schedule with the circle method
///
/// The first participant stays fixed and meets the others in list order, one
/// per round, while the remaining participants pair off around the circle.
/// Within a pairing the participant listed earlier takes side A. An odd field
/// gets a bye slot; whoever meets the bye sits the round out and no pairing is
/// emitted for it. Later legs continue the round numbering of the first.
pub fn round_robin(participants: &[ParticipantId], legs: Legs) -> TournamentResult<Vec<Pairing>> {
    if participants.len() < 2 {
        return Err(TournamentError::InsufficientParticipants {
            needed: 2,
            current: participants.len(),
        });
    }

    let mut seen = HashSet::with_capacity(participants.len());
    if let Some(&duplicate) = participants.iter().find(|&&p| !seen.insert(p)) {
        return Err(TournamentError::DuplicateParticipant(duplicate));
    }

    let first_leg = circle_rounds(participants);
    let rounds_per_leg = first_leg.len() as u32;

    let per_leg: usize = first_leg.iter().map(Vec::len).sum();
    let mut pairings = Vec::with_capacity(per_leg * legs.count() as usize);
    for leg in 0..legs.count() {
        let swapped = leg % 2 == 1;
        for (index, round) in first_leg.iter().enumerate() {
            let number = leg * rounds_per_leg + index as u32 + 1;
            pairings.extend(round.iter().map(|&(a, b)| {
                let (side_a, side_b) = if swapped { (b, a) } else { (a, b) };
                Pairing {
                    round: number,
                    side_a,
                    side_b,
                }
            }));
        }
    }

    log::debug!(
        "Generated {} pairings over {} rounds for {} participants",
        pairings.len(),
        rounds_per_leg * legs.count(),
        participants.len()
    );
    Ok(pairings)
}

fn circle_rounds(participants: &[ParticipantId]) -> Vec<Vec<(ParticipantId, ParticipantId)>> {
    let (&fixed, rest) = match participants.split_first() {
        Some(split) => split,
        None => return Vec::new(),
    };
    let mut ring: Vec<Option<ParticipantId>> = rest.iter().copied().map(Some).collect();
    if participants.len() % 2 == 1 {
        ring.push(None);
    }

    // The ring always has an odd length, so each round pairs the fixed
    // participant with one slot and mirrors the rest around it
    let m = ring.len();
    (0..m)
        .map(|r| {
            let mut round = Vec::with_capacity(m / 2 + 1);
            if let Some(opponent) = ring[r] {
                round.push((fixed, opponent));
            }
            for k in 1..=m / 2 {
                let (i, j) = ((r + k) % m, (r + m - k) % m);
                if let (Some(a), Some(b)) = (ring[i.min(j)], ring[i.max(j)]) {
                    round.push((a, b));
                }
            }
            round
        })
        .collect()
}
