use super::models::{PointsRecord, SeedingEntry};
use crate::errors::{TournamentError, TournamentResult};
use crate::ids::ParticipantId;
use crate::standings::{StandingsRow, position_of};
use std::cmp::Reverse;

/// Order eligible participants for the final stage
///
/// Sorted by total points, highest first. Equal totals go to whoever finished
/// higher in the phase 1 standings.
///
/// # Errors
///
/// - `IncompletePoints` if an eligible participant lacks a record or either
///   phase figure
/// - `DataIntegrity` if an eligible participant is missing from the phase 1
///   standings
pub fn final_seeding(
    eligible: &[ParticipantId],
    records: &[PointsRecord],
    phase1_standings: &[StandingsRow],
) -> TournamentResult<Vec<SeedingEntry>> {
    let mut entries = Vec::with_capacity(eligible.len());

    for &participant in eligible {
        let record = records
            .iter()
            .find(|record| record.participant == participant)
            .ok_or(TournamentError::IncompletePoints { participant })?;

        let (Some(phase1_points), Some(phase2_points)) =
            (record.phase1_points, record.phase2_points)
        else {
            return Err(TournamentError::IncompletePoints { participant });
        };

        let phase1_position = position_of(phase1_standings, participant).ok_or_else(|| {
            TournamentError::DataIntegrity(format!(
                "{participant} is eligible for seeding but missing from phase 1 standings"
            ))
        })?;

        entries.push(SeedingEntry {
            participant,
            phase1_points,
            phase2_points,
            total_points: phase1_points + phase2_points,
            phase1_position,
        });
    }

    entries.sort_by_key(|entry| (Reverse(entry.total_points), entry.phase1_position));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TournamentId;

    fn p(n: i64) -> ParticipantId {
        ParticipantId(n)
    }

    fn record(tournament: TournamentId, n: i64, one: u32, two: u32) -> PointsRecord {
        PointsRecord {
            phase1_points: Some(one),
            phase2_points: Some(two),
            ..PointsRecord::new(tournament, p(n))
        }
    }

    fn standings(order: &[i64]) -> Vec<StandingsRow> {
        order.iter().map(|&n| StandingsRow::new(p(n))).collect()
    }

    #[test]
    fn test_total_then_phase1_position() {
        let t = TournamentId::new();
        let records = [
            record(t, 1, 4, 1),
            record(t, 2, 3, 2),
            record(t, 3, 2, 4),
            record(t, 4, 1, 3),
        ];
        let seeding =
            final_seeding(&[p(1), p(2), p(3), p(4)], &records, &standings(&[1, 2, 3, 4])).unwrap();

        let order: Vec<_> = seeding.iter().map(|e| e.participant).collect();
        // 3 has 6; 1 and 2 both have 5 and 1 finished higher; 4 has 4
        assert_eq!(order, vec![p(3), p(1), p(2), p(4)]);
        assert_eq!(seeding[0].total_points, 6);
    }

    #[test]
    fn test_missing_phase_is_a_precondition_failure() {
        let t = TournamentId::new();
        let mut partial = record(t, 2, 3, 0);
        partial.phase2_points = None;
        let err = final_seeding(&[p(1), p(2)], &[record(t, 1, 4, 4), partial], &standings(&[1, 2]))
            .unwrap_err();
        assert!(matches!(err, TournamentError::IncompletePoints { participant } if participant == p(2)));

        let err = final_seeding(&[p(1), p(3)], &[record(t, 1, 4, 4)], &standings(&[1, 3]))
            .unwrap_err();
        assert!(matches!(err, TournamentError::IncompletePoints { .. }));
    }

    #[test]
    fn test_missing_from_standings_is_an_integrity_fault() {
        let t = TournamentId::new();
        let err = final_seeding(
            &[p(1), p(2)],
            &[record(t, 1, 4, 4), record(t, 2, 3, 3)],
            &standings(&[1]),
        )
        .unwrap_err();
        assert!(matches!(err, TournamentError::DataIntegrity(_)));
    }
}
