//! Integration tests for champions circuit tournaments
//!
//! League → gauntlet of best-of series → page playoff, with circuit points
//! from the first two phases deciding the playoff seeds.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tourney::bracket::{Knockout, RoundStage, Series};
use tourney::fixtures::Legs;
use tourney::matches::{Match, MatchContainer, MatchStatus, StageStatus};
use tourney::points::Phase;
use tourney::tournament::TournamentStatus;
use tourney::{
    EngineConfig, InMemoryStore, KnockoutId, NewTournament, ParticipantId, Progress,
    ProgressionEvent, SeriesId, TournamentError, TournamentFormat, TournamentId,
    TournamentManager,
};

/// Kick-off time every result in these tests is recorded at
fn full_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 2, 18, 0, 0).unwrap()
}

fn p(n: i64) -> ParticipantId {
    ParticipantId(n)
}

fn manager() -> TournamentManager {
    TournamentManager::new(Arc::new(InMemoryStore::new()), EngineConfig::default())
}

/// Six-player circuit whose league finishes in id order
async fn circuit_after_league(
    manager: &TournamentManager,
    gauntlet_best_of: u32,
) -> (TournamentId, KnockoutId, Vec<Progress>) {
    let tournament = manager
        .create_tournament(NewTournament {
            name: "Circuit".to_string(),
            format: TournamentFormat::ChampionsCircuit { gauntlet_best_of },
            max_participants: 6,
            legs: Legs::Single,
        })
        .await
        .unwrap();
    let league = tournament.league().unwrap();
    for n in 1..=6 {
        manager.register_participant(league, p(n)).await.unwrap();
    }
    manager.generate_fixtures(league).await.unwrap();

    let mut progress = Vec::new();
    for game in manager.matches(MatchContainer::League(league)).await.unwrap() {
        let (score_a, score_b) = if game.side_a < game.side_b { (3, 1) } else { (1, 3) };
        progress.push(
            manager
                .on_match_completed(game.id, score_a, score_b, None, full_time())
                .await
                .unwrap(),
        );
    }

    let gauntlet = manager.tournament(tournament.id).await.unwrap().knockouts()[0];
    (tournament.id, gauntlet, progress)
}

fn series_of(knockout: &Knockout, stage: RoundStage) -> SeriesId {
    let index = knockout.round_index(stage).unwrap();
    knockout.rounds[index].series[0]
}

/// Play the latest open game of a series, `winner` taking it 2-0
async fn play_game(manager: &TournamentManager, series: SeriesId, winner: ParticipantId) -> Progress {
    let current = manager.series(series).await.unwrap();
    let game = manager
        .get_match(*current.matches.last().unwrap())
        .await
        .unwrap();
    assert!(!game.is_completed());
    let (score_a, score_b) = if game.side_a == winner { (2, 0) } else { (0, 2) };
    manager
        .on_match_completed(game.id, score_a, score_b, None, full_time())
        .await
        .unwrap()
}

async fn page_match(manager: &TournamentManager, knockout: KnockoutId, stage: RoundStage, slot: usize) -> Match {
    let knockout = manager.knockout(knockout).await.unwrap();
    let index = knockout.round_index(stage).unwrap();
    manager
        .get_match(knockout.rounds[index].matches[slot])
        .await
        .unwrap()
}

async fn beat(manager: &TournamentManager, game: &Match, winner: ParticipantId) -> Progress {
    let (score_a, score_b) = if game.side_a == winner { (1, 0) } else { (0, 1) };
    manager
        .on_match_completed(game.id, score_a, score_b, None, full_time())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_league_awards_phase_one_and_seeds_gauntlet() {
    let manager = manager();
    let (tournament, gauntlet_id, progress) = circuit_after_league(&manager, 3).await;

    let last = progress.last().unwrap().events();
    assert!(last.contains(&ProgressionEvent::PointsAwarded {
        tournament,
        phase: Phase::One,
        participants: 6,
    }));
    assert!(last.contains(&ProgressionEvent::StageSeeded {
        tournament,
        knockout: gauntlet_id,
        seeds: vec![p(1), p(2), p(3), p(4)],
    }));

    let points = manager.points(tournament).await.unwrap();
    let phase1: Vec<_> = points
        .iter()
        .map(|record| (record.participant, record.phase1_points, record.phase2_points))
        .collect();
    assert_eq!(
        phase1,
        vec![
            (p(1), Some(4), None),
            (p(2), Some(3), None),
            (p(3), Some(2), None),
            (p(4), Some(1), None),
            (p(5), Some(0), None),
            (p(6), Some(0), None),
        ]
    );

    let gauntlet = manager.knockout(gauntlet_id).await.unwrap();
    assert_eq!(gauntlet.name, "Circuit Gauntlet");
    assert_eq!(
        gauntlet.rounds.iter().map(|round| round.stage).collect::<Vec<_>>(),
        vec![
            RoundStage::Gauntlet(1),
            RoundStage::Gauntlet(2),
            RoundStage::GauntletFinal
        ]
    );

    let opener = manager
        .series(series_of(&gauntlet, RoundStage::Gauntlet(1)))
        .await
        .unwrap();
    assert_eq!((opener.player1, opener.player2), (p(4), p(3)));
    assert_eq!(opener.name, "Gauntlet Round 1");
    assert_eq!(opener.best_of, 3);
    assert_eq!(opener.status, StageStatus::Upcoming);

    let game_one = manager.get_match(opener.matches[0]).await.unwrap();
    assert_eq!(game_one.label, "Gauntlet Round 1 - Game 1");
    assert_eq!(game_one.status, MatchStatus::Unpublished);
    assert_eq!(game_one.container, MatchContainer::Series(opener.id));

    assert!(matches!(
        manager.compute_final_seeding(tournament).await,
        Err(TournamentError::PhaseNotFinalized(_))
    ));
}

#[tokio::test]
async fn test_series_ends_once_decided() {
    let manager = manager();
    let (_, gauntlet_id, _) = circuit_after_league(&manager, 3).await;
    let gauntlet = manager.knockout(gauntlet_id).await.unwrap();
    let opener = series_of(&gauntlet, RoundStage::Gauntlet(1));

    manager.publish_series(opener).await.unwrap();
    let series = manager.series(opener).await.unwrap();
    assert_eq!(series.status, StageStatus::Active);
    assert_eq!(
        manager.get_match(series.matches[0]).await.unwrap().status,
        MatchStatus::Scheduled
    );

    let first = play_game(&manager, opener, p(4)).await;
    assert!(first.events().iter().any(|event| matches!(
        event,
        ProgressionEvent::SeriesGameScheduled { game: 2, .. }
    )));
    let series = manager.series(opener).await.unwrap();
    assert_eq!(series.matches.len(), 2);
    let game_two = manager.get_match(series.matches[1]).await.unwrap();
    assert_eq!(game_two.label, "Gauntlet Round 1 - Game 2");
    assert_eq!(game_two.status, MatchStatus::Scheduled);

    let second = play_game(&manager, opener, p(4)).await;
    assert!(second.events().contains(&ProgressionEvent::SeriesCompleted {
        series: opener,
        winner: p(4),
    }));

    let series = manager.series(opener).await.unwrap();
    assert_eq!(series.status, StageStatus::Completed);
    assert_eq!((series.wins_p1, series.wins_p2), (2, 0));
    assert_eq!(series.matches.len(), 2);

    // The winner climbs to face the next seed up
    let gauntlet = manager.knockout(gauntlet_id).await.unwrap();
    let next: Series = manager
        .series(series_of(&gauntlet, RoundStage::Gauntlet(2)))
        .await
        .unwrap();
    assert_eq!((next.player1, next.player2), (p(4), p(2)));

    // Replaying the deciding game changes nothing
    let replay = manager
        .on_match_completed(series.matches[1], 2, 0, None, full_time())
        .await
        .unwrap();
    assert_eq!(replay, Progress::AlreadyApplied);
    let gauntlet = manager.knockout(gauntlet_id).await.unwrap();
    assert_eq!(gauntlet.rounds[1].series.len(), 1);
}

#[tokio::test]
async fn test_series_game_needs_decisive_result() {
    let manager = manager();
    let (_, gauntlet_id, _) = circuit_after_league(&manager, 3).await;
    let gauntlet = manager.knockout(gauntlet_id).await.unwrap();
    let opener = manager
        .series(series_of(&gauntlet, RoundStage::Gauntlet(1)))
        .await
        .unwrap();

    assert!(matches!(
        manager.on_match_completed(opener.matches[0], 1, 1, None, full_time()).await,
        Err(TournamentError::TieBreakRequired { .. })
    ));
    manager
        .on_match_completed(opener.matches[0], 1, 1, Some(p(3)), full_time())
        .await
        .unwrap();
    let series = manager.series(opener.id).await.unwrap();
    assert_eq!((series.wins_p1, series.wins_p2), (0, 1));
}

#[tokio::test]
async fn test_full_circuit_to_champion() {
    let manager = manager();
    let (tournament, gauntlet_id, _) = circuit_after_league(&manager, 3).await;

    // Gauntlet: 4 sweeps 3, 2 edges 4, 2 sweeps 1
    let gauntlet = manager.knockout(gauntlet_id).await.unwrap();
    let round_one = series_of(&gauntlet, RoundStage::Gauntlet(1));
    play_game(&manager, round_one, p(4)).await;
    play_game(&manager, round_one, p(4)).await;

    let published = manager
        .publish_knockout_round(gauntlet_id, RoundStage::Gauntlet(2))
        .await
        .unwrap();
    assert!(published.is_applied());

    let gauntlet = manager.knockout(gauntlet_id).await.unwrap();
    let round_two = series_of(&gauntlet, RoundStage::Gauntlet(2));
    assert_eq!(manager.series(round_two).await.unwrap().status, StageStatus::Active);
    play_game(&manager, round_two, p(4)).await;
    play_game(&manager, round_two, p(2)).await;
    play_game(&manager, round_two, p(2)).await;
    assert_eq!(manager.series(round_two).await.unwrap().matches.len(), 3);

    let gauntlet = manager.knockout(gauntlet_id).await.unwrap();
    let final_series = series_of(&gauntlet, RoundStage::GauntletFinal);
    let finalists = manager.series(final_series).await.unwrap();
    assert_eq!((finalists.player1, finalists.player2), (p(2), p(1)));
    assert_eq!(finalists.name, "Gauntlet Final");

    play_game(&manager, final_series, p(2)).await;
    let decided = play_game(&manager, final_series, p(2)).await;
    assert!(decided.events().contains(&ProgressionEvent::KnockoutCompleted {
        knockout: gauntlet_id,
        champion: p(2),
    }));
    assert!(decided.events().contains(&ProgressionEvent::PointsAwarded {
        tournament,
        phase: Phase::Two,
        participants: 4,
    }));

    let gauntlet = manager.knockout(gauntlet_id).await.unwrap();
    assert_eq!(gauntlet.placements, vec![p(2), p(1), p(4), p(3)]);

    // 1 and 2 both total 7, as do 3 and 4 with 3; league position breaks ties
    let seeding = manager.compute_final_seeding(tournament).await.unwrap();
    let summary: Vec<_> = seeding
        .iter()
        .map(|entry| (entry.participant, entry.total_points))
        .collect();
    assert_eq!(
        summary,
        vec![(p(1), 7), (p(2), 7), (p(3), 3), (p(4), 3)]
    );

    let stored = manager.tournament(tournament).await.unwrap();
    assert_eq!(stored.stages.len(), 3);
    assert_eq!(stored.status, TournamentStatus::Live);
    let playoff_id = stored.knockouts()[1];
    let playoff = manager.knockout(playoff_id).await.unwrap();
    assert_eq!(playoff.seeds, vec![p(1), p(2), p(3), p(4)]);
    assert_eq!(playoff.name, "Circuit Page Playoff");

    // Page playoff: A 1 beats 2, B 4 beats 3, C 4 beats 2, D 1 beats 4
    let match_a = page_match(&manager, playoff_id, RoundStage::PageQualifiers, 0).await;
    let match_b = page_match(&manager, playoff_id, RoundStage::PageQualifiers, 1).await;
    assert_eq!((match_a.side_a, match_a.side_b), (p(1), p(2)));
    assert_eq!((match_b.side_a, match_b.side_b), (p(3), p(4)));
    assert_eq!(match_a.label, "Match A");
    beat(&manager, &match_a, p(1)).await;
    beat(&manager, &match_b, p(4)).await;

    let match_c = page_match(&manager, playoff_id, RoundStage::PageSemiFinal, 0).await;
    assert_eq!((match_c.side_a, match_c.side_b), (p(2), p(4)));
    assert_eq!(match_c.label, "Match C");
    beat(&manager, &match_c, p(4)).await;

    let match_d = page_match(&manager, playoff_id, RoundStage::PageFinal, 0).await;
    assert_eq!((match_d.side_a, match_d.side_b), (p(1), p(4)));
    let done = beat(&manager, &match_d, p(1)).await;
    assert!(done.events().contains(&ProgressionEvent::TournamentCompleted {
        tournament,
        champion: p(1),
    }));

    let playoff = manager.knockout(playoff_id).await.unwrap();
    assert_eq!(playoff.placements, vec![p(1), p(4), p(2), p(3)]);
    let stored = manager.tournament(tournament).await.unwrap();
    assert_eq!(stored.status, TournamentStatus::Completed);
    assert_eq!(stored.champion, Some(p(1)));
}

#[tokio::test]
async fn test_single_game_gauntlet() {
    let manager = manager();
    let (_, gauntlet_id, _) = circuit_after_league(&manager, 1).await;

    let gauntlet = manager.knockout(gauntlet_id).await.unwrap();
    let opener = series_of(&gauntlet, RoundStage::Gauntlet(1));
    let progress = play_game(&manager, opener, p(3)).await;
    assert!(progress.events().contains(&ProgressionEvent::SeriesCompleted {
        series: opener,
        winner: p(3),
    }));

    let gauntlet = manager.knockout(gauntlet_id).await.unwrap();
    let next = manager
        .series(series_of(&gauntlet, RoundStage::Gauntlet(2)))
        .await
        .unwrap();
    assert_eq!((next.player1, next.player2, next.best_of), (p(3), p(2), 1));
}
