/// Property-based tests for fixture generation and standings using proptest
///
/// These tests check the schedule and table invariants across random field
/// sizes and random results.
use chrono::Utc;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use tourney::fixtures::{Legs, round_robin};
use tourney::matches::{Match, MatchContainer, MatchStatus, RoundTag};
use tourney::standings::{DRAW_POINTS, WIN_POINTS, compute_standings};
use tourney::{LeagueId, ParticipantId};

fn field(n: usize) -> Vec<ParticipantId> {
    (1..=n as i64).map(ParticipantId).collect()
}

fn legs_strategy() -> impl Strategy<Value = Legs> {
    prop_oneof![Just(Legs::Single), Just(Legs::Double), Just(Legs::Triple)]
}

// A field plus a score for every single-leg fixture
fn results_strategy() -> impl Strategy<Value = (usize, Vec<(u32, u32)>)> {
    (2usize..=9).prop_flat_map(|n| {
        let fixtures = n * (n - 1) / 2;
        (Just(n), prop::collection::vec((0u32..6, 0u32..6), fixtures))
    })
}

fn played_league(n: usize, scores: &[(u32, u32)]) -> (Vec<ParticipantId>, Vec<Match>) {
    let participants = field(n);
    let league = LeagueId::new();
    let matches = round_robin(&participants, Legs::Single)
        .unwrap()
        .into_iter()
        .zip(scores)
        .map(|(pairing, &(score_a, score_b))| {
            let mut game = Match::new(
                pairing.side_a,
                pairing.side_b,
                RoundTag::League {
                    round: pairing.round,
                },
                format!("Round {}", pairing.round),
                MatchContainer::League(league),
                MatchStatus::Scheduled,
            );
            game.record_result(score_a, score_b, None, Utc::now()).unwrap();
            game
        })
        .collect();
    (participants, matches)
}

proptest! {
    #[test]
    fn test_every_pair_meets_once_per_leg(n in 2usize..=12, legs in legs_strategy()) {
        let participants = field(n);
        let pairings = round_robin(&participants, legs).unwrap();

        let mut meetings: HashMap<(ParticipantId, ParticipantId), u32> = HashMap::new();
        for pairing in &pairings {
            prop_assert_ne!(pairing.side_a, pairing.side_b);
            let key = if pairing.side_a < pairing.side_b {
                (pairing.side_a, pairing.side_b)
            } else {
                (pairing.side_b, pairing.side_a)
            };
            *meetings.entry(key).or_default() += 1;
        }

        prop_assert_eq!(meetings.len(), n * (n - 1) / 2);
        prop_assert!(meetings.values().all(|&count| count == legs.count()));
    }

    #[test]
    fn test_nobody_plays_twice_in_a_round(n in 2usize..=12, legs in legs_strategy()) {
        let pairings = round_robin(&field(n), legs).unwrap();

        let mut seen: HashSet<(u32, ParticipantId)> = HashSet::new();
        for pairing in &pairings {
            prop_assert!(seen.insert((pairing.round, pairing.side_a)));
            prop_assert!(seen.insert((pairing.round, pairing.side_b)));
        }
    }

    #[test]
    fn test_round_count_and_byes(n in 2usize..=12) {
        let pairings = round_robin(&field(n), Legs::Single).unwrap();
        let rounds = pairings.iter().map(|p| p.round).max().unwrap();
        let expected_rounds = if n % 2 == 0 { n - 1 } else { n };
        prop_assert_eq!(rounds as usize, expected_rounds);

        // Odd fields sit exactly one participant out per round
        for round in 1..=rounds {
            let in_round = pairings.iter().filter(|p| p.round == round).count();
            prop_assert_eq!(in_round, n / 2);
        }
    }

    #[test]
    fn test_home_and_away_balance_over_two_legs(n in 2usize..=10) {
        let pairings = round_robin(&field(n), Legs::Double).unwrap();
        let mut ordered: HashMap<(ParticipantId, ParticipantId), u32> = HashMap::new();
        for pairing in &pairings {
            *ordered.entry((pairing.side_a, pairing.side_b)).or_default() += 1;
        }
        for (&(a, b), &count) in &ordered {
            prop_assert_eq!(count, 1);
            prop_assert_eq!(ordered.get(&(b, a)).copied(), Some(1));
        }
    }

    #[test]
    fn test_generation_deterministic(n in 2usize..=12, legs in legs_strategy()) {
        let participants = field(n);
        prop_assert_eq!(
            round_robin(&participants, legs).unwrap(),
            round_robin(&participants, legs).unwrap()
        );
    }

    #[test]
    fn test_standings_row_identities((n, scores) in results_strategy()) {
        let (participants, matches) = played_league(n, &scores);
        let rows = compute_standings(&participants, &matches);

        prop_assert_eq!(rows.len(), n);
        for row in &rows {
            prop_assert_eq!(row.played, row.wins + row.draws + row.losses);
            prop_assert_eq!(row.played as usize, n - 1);
            prop_assert_eq!(row.points, WIN_POINTS * row.wins + DRAW_POINTS * row.draws);
            prop_assert_eq!(
                row.goal_difference,
                row.goals_for as i64 - row.goals_against as i64
            );
        }

        let goals_for: u32 = rows.iter().map(|row| row.goals_for).sum();
        let goals_against: u32 = rows.iter().map(|row| row.goals_against).sum();
        prop_assert_eq!(goals_for, goals_against);

        let wins: u32 = rows.iter().map(|row| row.wins).sum();
        let losses: u32 = rows.iter().map(|row| row.losses).sum();
        prop_assert_eq!(wins, losses);
    }

    #[test]
    fn test_standings_sorted_and_deterministic((n, scores) in results_strategy()) {
        let (participants, matches) = played_league(n, &scores);
        let rows = compute_standings(&participants, &matches);

        for pair in rows.windows(2) {
            let key = |row: &tourney::standings::StandingsRow| {
                (row.points, row.goal_difference, row.goals_for)
            };
            prop_assert!(key(&pair[0]) >= key(&pair[1]));
        }

        let mut reversed = matches.clone();
        reversed.reverse();
        prop_assert_eq!(rows, compute_standings(&participants, &reversed));
    }
}
