//! Integration tests for squad matches decided by sub-contests

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tourney::fixtures::Legs;
use tourney::matches::{Lineup, Match, MatchContainer, SubContestKind};
use tourney::tournament::TournamentStatus;
use tourney::{
    EngineConfig, ErrorClass, InMemoryStore, NewTournament, ParticipantId, Progress,
    ProgressionEvent, Side, TournamentError, TournamentFormat, TournamentId, TournamentManager,
};

/// Kick-off time every result in these tests is recorded at
fn full_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 2, 18, 0, 0).unwrap()
}

const HOME: ParticipantId = ParticipantId(1);
const AWAY: ParticipantId = ParticipantId(2);

fn lineup(base: i64) -> Lineup {
    Lineup {
        star: ParticipantId(base),
        first_day: ParticipantId(base + 1),
        late_night: ParticipantId(base + 2),
    }
}

/// Two-club league with its only fixture
async fn squad_match(format: TournamentFormat) -> (TournamentManager, TournamentId, Match) {
    let manager = TournamentManager::new(Arc::new(InMemoryStore::new()), EngineConfig::default());
    let tournament = manager
        .create_tournament(NewTournament {
            name: "Squads".to_string(),
            format,
            max_participants: 2,
            legs: Legs::Single,
        })
        .await
        .unwrap();
    let league = tournament.league().unwrap();
    manager.register_participant(league, HOME).await.unwrap();
    manager.register_participant(league, AWAY).await.unwrap();
    manager.generate_fixtures(league).await.unwrap();

    let game = manager.matches(MatchContainer::League(league)).await.unwrap()[0].clone();
    (manager, tournament.id, game)
}

fn lineup_for(game: &Match, side: Side) -> Lineup {
    // Squad members are numbered after their club
    let club = match side {
        Side::A => game.side_a,
        Side::B => game.side_b,
    };
    lineup(club.0 * 10)
}

#[tokio::test]
async fn test_sub_contests_decide_league_match() {
    let (manager, tournament, game) = squad_match(TournamentFormat::LeagueOnly).await;

    let first = manager
        .submit_lineup(game.id, Side::A, lineup_for(&game, Side::A))
        .await
        .unwrap();
    assert!(first.events().contains(&ProgressionEvent::LineupSubmitted {
        match_id: game.id,
        side: Side::A,
        sub_contests_ready: false,
    }));
    assert!(matches!(
        manager
            .record_sub_contest(game.id, SubContestKind::StarPlayer, 1, 0, None, full_time())
            .await,
        Err(TournamentError::InvalidState { .. })
    ));

    let second = manager
        .submit_lineup(game.id, Side::B, lineup_for(&game, Side::B))
        .await
        .unwrap();
    assert!(second.events().contains(&ProgressionEvent::LineupSubmitted {
        match_id: game.id,
        side: Side::B,
        sub_contests_ready: true,
    }));

    let stored = manager.get_match(game.id).await.unwrap();
    let contests = &stored.composite.as_ref().unwrap().sub_contests;
    assert_eq!(contests.len(), 3);
    assert_eq!(contests[0].player_a, lineup_for(&game, Side::A).star);
    assert_eq!(contests[0].player_b, lineup_for(&game, Side::B).star);

    // Plain results are refused once sub-contests exist
    assert!(matches!(
        manager.on_match_completed(game.id, 1, 0, None, full_time()).await,
        Err(TournamentError::UnsupportedOperation(_))
    ));

    // Side A: win, draw, loss for 4 points and 3 goals; side B: 4 points, 2 goals
    manager
        .record_sub_contest(game.id, SubContestKind::StarPlayer, 2, 0, None, full_time())
        .await
        .unwrap();
    let replay = manager
        .record_sub_contest(game.id, SubContestKind::StarPlayer, 0, 5, None, full_time())
        .await
        .unwrap();
    assert_eq!(replay, Progress::AlreadyApplied);

    manager
        .record_sub_contest(game.id, SubContestKind::FirstDayPlayer, 1, 1, None, full_time())
        .await
        .unwrap();
    let partial = manager.get_match(game.id).await.unwrap();
    assert!(!partial.is_completed());
    assert_eq!((partial.score_a, partial.score_b), (4, 1));

    let last = manager
        .record_sub_contest(game.id, SubContestKind::LateNightPlayer, 0, 1, None, full_time())
        .await
        .unwrap();
    assert!(last.events().contains(&ProgressionEvent::MatchCompleted {
        match_id: game.id,
        winner: None,
    }));

    let finished = manager.get_match(game.id).await.unwrap();
    assert!(finished.is_completed());
    assert_eq!((finished.score_a, finished.score_b), (4, 4));
    assert_eq!(finished.goals(), (3, 2));

    // Level on points; goal difference picks the champion
    let rows = manager
        .compute_standings(MatchContainer::League(
            manager.tournament(tournament).await.unwrap().league().unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(rows[0].participant, finished.side_a);
    assert_eq!(rows[0].draws, 1);

    let stored = manager.tournament(tournament).await.unwrap();
    assert_eq!(stored.status, TournamentStatus::Completed);
    assert_eq!(stored.champion, Some(finished.side_a));

    assert!(matches!(
        manager
            .submit_lineup(game.id, Side::A, lineup(70))
            .await,
        Err(TournamentError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn test_lineups_frozen_after_first_result() {
    let (manager, _, game) = squad_match(TournamentFormat::LeagueOnly).await;
    manager
        .submit_lineup(game.id, Side::A, lineup(10))
        .await
        .unwrap();
    manager
        .submit_lineup(game.id, Side::B, lineup(20))
        .await
        .unwrap();

    // Resubmitting before any result regenerates the pairings
    manager
        .submit_lineup(game.id, Side::B, lineup(30))
        .await
        .unwrap();
    let stored = manager.get_match(game.id).await.unwrap();
    assert_eq!(
        stored.composite.as_ref().unwrap().sub_contests[0].player_b,
        ParticipantId(30)
    );

    manager
        .record_sub_contest(game.id, SubContestKind::FirstDayPlayer, 3, 2, None, full_time())
        .await
        .unwrap();
    assert!(matches!(
        manager.submit_lineup(game.id, Side::B, lineup(40)).await,
        Err(TournamentError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn test_player_fielded_by_both_sides_is_refused() {
    let (manager, _, game) = squad_match(TournamentFormat::LeagueOnly).await;
    let everywhere = Lineup {
        star: ParticipantId(10),
        first_day: ParticipantId(10),
        late_night: ParticipantId(10),
    };
    manager
        .submit_lineup(game.id, Side::A, everywhere)
        .await
        .unwrap();

    let clash = Lineup {
        star: ParticipantId(10),
        first_day: ParticipantId(21),
        late_night: ParticipantId(22),
    };
    let err = manager
        .submit_lineup(game.id, Side::B, clash)
        .await
        .unwrap_err();
    assert!(matches!(err, TournamentError::LineupConflict(player) if player == ParticipantId(10)));
    assert_eq!(err.class(), ErrorClass::Precondition);

    let stored = manager.get_match(game.id).await.unwrap();
    let composite = stored.composite.as_ref().unwrap();
    assert!(composite.lineup_b.is_none());
    assert!(composite.sub_contests.is_empty());

    // With a clean lineup, side B's win is credited to side B
    manager
        .submit_lineup(game.id, Side::B, lineup(20))
        .await
        .unwrap();
    manager
        .record_sub_contest(game.id, SubContestKind::StarPlayer, 0, 3, None, full_time())
        .await
        .unwrap();
    let stored = manager.get_match(game.id).await.unwrap();
    assert_eq!((stored.score_a, stored.score_b), (0, 3));
    assert_eq!(
        stored.composite.as_ref().unwrap().sub_contests[0].winning_side,
        Some(Side::B)
    );
}
