use serde::{Deserialize, Serialize};

/// Placement to points mapping shared by every scoring phase
///
/// Placements are 1-indexed; anything past the end of the table scores 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementPoints(Vec<u32>);

impl PlacementPoints {
    pub fn new(points: Vec<u32>) -> Self {
        Self(points)
    }

    /// Points for a 1-indexed placement
    pub fn points_for(&self, placement: usize) -> u32 {
        placement
            .checked_sub(1)
            .and_then(|index| self.0.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// Pair each participant in finishing order with its points
    pub fn award<T: Copy>(&self, finishing_order: &[T]) -> Vec<(T, u32)> {
        finishing_order
            .iter()
            .enumerate()
            .map(|(index, &entry)| (entry, self.points_for(index + 1)))
            .collect()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl Default for PlacementPoints {
    fn default() -> Self {
        Self(vec![4, 3, 2, 1])
    }
}
