//! Match completion and bracket advancement.
//!
//! A completion always rewrites its container (league, knockout or series)
//! along with the match. Two completions in the same container therefore
//! race on the container's version, and the loser retries against the
//! winner's state instead of acting on a stale view of its siblings.

use super::models::ProgressionEvent;
use super::phases;
use super::transition::Transition;
use crate::bracket::{BracketAction, BracketRules, Knockout, Series, SeriesProgress};
use crate::db::Versioned;
use crate::errors::{TournamentError, TournamentResult};
use crate::ids::{MatchId, ParticipantId, SeriesId, Side};
use crate::league::League;
use crate::matches::{
    Composite, Lineup, Match, MatchContainer, MatchStatus, RoundTag, StageStatus, SubContestKind,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Apply a final score to a match
///
/// Returns `false` when the match was already completed.
pub(crate) async fn complete_match(
    tx: &mut Transition<'_>,
    match_id: MatchId,
    score_a: u32,
    score_b: u32,
    tie_break: Option<ParticipantId>,
    at: DateTime<Utc>,
) -> TournamentResult<bool> {
    let record = tx.load::<Match>(match_id).await?;

    if record.is_completed() {
        if (record.score_a, record.score_b) == (score_a, score_b) {
            log::debug!("Match {match_id} already completed; ignoring duplicate result");
        } else {
            log::warn!(
                "Match {match_id} already completed {}-{}, ignoring {score_a}-{score_b}",
                record.score_a,
                record.score_b
            );
        }
        return Ok(false);
    }

    if record
        .composite
        .as_ref()
        .is_some_and(|composite| !composite.sub_contests.is_empty())
    {
        return Err(TournamentError::UnsupportedOperation(format!(
            "match {match_id} is decided by its sub-contests"
        )));
    }

    finish_match(tx, record, score_a, score_b, tie_break, at).await?;
    Ok(true)
}

/// Complete a loaded match and advance whatever contains it
pub(crate) async fn finish_match(
    tx: &mut Transition<'_>,
    mut record: Versioned<Match>,
    score_a: u32,
    score_b: u32,
    tie_break: Option<ParticipantId>,
    at: DateTime<Utc>,
) -> TournamentResult<()> {
    match record.container {
        MatchContainer::League(league_id) => {
            let mut league = tx.load::<League>(league_id).await?;
            if league.status != StageStatus::Active {
                return Err(TournamentError::InvalidState {
                    entity: "league",
                    expected: StageStatus::Active.to_string(),
                    actual: league.status.to_string(),
                });
            }

            let winner = record.record_result(score_a, score_b, tie_break, at)?;
            log_result(&record);
            tx.emit(ProgressionEvent::MatchCompleted {
                match_id: record.id,
                winner,
            });
            tx.update(&record)?;

            let mut matches: Vec<Match> = tx
                .load_all::<Match>(&league.matches)
                .await?
                .into_iter()
                .map(Versioned::into_inner)
                .collect();
            if let Some(stale) = matches.iter_mut().find(|game| game.id == record.id) {
                *stale = record.value.clone();
            }

            if matches.iter().all(Match::is_completed) {
                phases::finish_league(tx, &mut league, &matches).await?;
            }
            tx.update(&league)?;
        }

        MatchContainer::Knockout(knockout_id) => {
            let mut knockout = tx.load::<Knockout>(knockout_id).await?;
            require_open(&knockout)?;

            let winner = record.record_result(score_a, score_b, tie_break, at)?;
            log_result(&record);
            tx.emit(ProgressionEvent::MatchCompleted {
                match_id: record.id,
                winner,
            });
            tx.update(&record)?;

            advance_knockout(tx, &mut knockout, &[record.into_inner()], &[]).await?;
            tx.update(&knockout)?;
        }

        MatchContainer::Series(series_id) => {
            let mut series = tx.load::<Series>(series_id).await?;

            let winner = record
                .record_result(score_a, score_b, tie_break, at)?
                .ok_or_else(|| {
                    TournamentError::DataIntegrity(format!(
                        "series game {} completed without a winner",
                        record.id
                    ))
                })?;
            log_result(&record);
            tx.emit(ProgressionEvent::MatchCompleted {
                match_id: record.id,
                winner: Some(winner),
            });
            tx.update(&record)?;

            match series.record_game(winner)? {
                SeriesProgress::NextGame(game) => {
                    if series.matches.len() < game as usize {
                        let next = series.game(game, MatchStatus::Scheduled);
                        series.matches.push(next.id);
                        tx.insert(&next)?;
                        log::info!("Scheduled {}", next.label);
                        tx.emit(ProgressionEvent::SeriesGameScheduled {
                            series: series.id,
                            match_id: next.id,
                            game,
                        });
                    }
                }
                SeriesProgress::Decided(series_winner) => {
                    log::info!(
                        "{} won by {series_winner} ({}-{})",
                        series.name,
                        series.wins_p1,
                        series.wins_p2
                    );
                    tx.emit(ProgressionEvent::SeriesCompleted {
                        series: series.id,
                        winner: series_winner,
                    });

                    let mut knockout = tx.load::<Knockout>(series.knockout).await?;
                    require_open(&knockout)?;
                    advance_knockout(
                        tx,
                        &mut knockout,
                        &[record.into_inner()],
                        std::slice::from_ref(&series.value),
                    )
                    .await?;
                    tx.update(&knockout)?;
                }
            }
            tx.update(&series)?;
        }
    }

    Ok(())
}

fn log_result(game: &Match) {
    match game.winner {
        Some(winner) => log::info!(
            "{} ({}) completed {}-{}, won by {winner}",
            game.label,
            game.id,
            game.score_a,
            game.score_b
        ),
        None => log::info!(
            "{} ({}) completed {}-{}, drawn",
            game.label,
            game.id,
            game.score_a,
            game.score_b
        ),
    }
}

fn require_open(knockout: &Knockout) -> TournamentResult<()> {
    if knockout.status == StageStatus::Completed {
        return Err(TournamentError::InvalidState {
            entity: "knockout",
            expected: "Upcoming or Active".to_string(),
            actual: knockout.status.to_string(),
        });
    }
    Ok(())
}

/// Re-evaluate a bracket after some of its entities changed in this transition
async fn advance_knockout(
    tx: &mut Transition<'_>,
    knockout: &mut Versioned<Knockout>,
    changed_matches: &[Match],
    changed_series: &[Series],
) -> TournamentResult<()> {
    if knockout.status == StageStatus::Upcoming {
        knockout.status = StageStatus::Active;
    }

    let mut matches: HashMap<MatchId, Match> = tx
        .load_all::<Match>(&knockout.match_ids())
        .await?
        .into_iter()
        .map(|record| (record.id, record.into_inner()))
        .collect();
    matches.extend(changed_matches.iter().map(|game| (game.id, game.clone())));

    let mut series: HashMap<SeriesId, Series> = tx
        .load_all::<Series>(&knockout.series_ids())
        .await?
        .into_iter()
        .map(|record| (record.id, record.into_inner()))
        .collect();
    series.extend(changed_series.iter().map(|set| (set.id, set.clone())));

    let actions = {
        let snapshot = knockout.snapshot(&matches, &series)?;
        knockout.format.advance(&snapshot)?
    };
    apply_actions(tx, knockout, actions)?;

    if knockout.status == StageStatus::Completed {
        phases::finish_knockout(tx, knockout).await?;
    }
    Ok(())
}

/// Turn bracket decisions into staged records
///
/// Rounds that already hold entities are left alone, so replaying a decision
/// never duplicates a match or series.
pub(crate) fn apply_actions(
    tx: &mut Transition<'_>,
    knockout: &mut Knockout,
    actions: Vec<BracketAction>,
) -> TournamentResult<()> {
    let knockout_id = knockout.id;

    for action in actions {
        match action {
            BracketAction::CreateMatches { round, pairings } => {
                let slot = round_mut(knockout, round)?;
                if slot.is_populated() {
                    log::debug!("{} of knockout {knockout_id} already exists", slot.name);
                    continue;
                }

                let stage = slot.stage;
                let mut created = Vec::with_capacity(pairings.len());
                for (index, (side_a, side_b)) in pairings.into_iter().enumerate() {
                    let index = index as u32;
                    let game = Match::new(
                        side_a,
                        side_b,
                        RoundTag::Knockout { stage, slot: index },
                        stage.match_label(index),
                        MatchContainer::Knockout(knockout_id),
                        MatchStatus::Unpublished,
                    );
                    tx.insert(&game)?;
                    created.push(game.id);
                }

                log::info!("Created {} ({} matches)", slot.name, created.len());
                slot.matches = created.clone();
                tx.emit(ProgressionEvent::RoundCreated {
                    knockout: knockout_id,
                    stage,
                    matches: created,
                });
            }

            BracketAction::CreateSeries {
                round,
                player1,
                player2,
                best_of,
            } => {
                let slot = round_mut(knockout, round)?;
                if slot.is_populated() {
                    log::debug!("{} of knockout {knockout_id} already exists", slot.name);
                    continue;
                }

                let stage = slot.stage;
                let mut series = Series::new(
                    knockout_id,
                    stage,
                    stage.match_label(0),
                    player1,
                    player2,
                    best_of,
                )?;
                let opener = series.game(1, MatchStatus::Unpublished);
                series.matches.push(opener.id);
                tx.insert(&opener)?;
                tx.insert(&series)?;

                log::info!(
                    "Created {}: {player1} v {player2}, best of {best_of}",
                    series.name
                );
                slot.series.push(series.id);
                tx.emit(ProgressionEvent::SeriesCreated {
                    knockout: knockout_id,
                    stage,
                    series: series.id,
                });
            }

            BracketAction::Complete {
                champion,
                placements,
            } => {
                if knockout.status == StageStatus::Completed {
                    continue;
                }
                knockout.status = StageStatus::Completed;
                knockout.champion = Some(champion);
                knockout.placements = placements;

                log::info!("{} completed, won by {champion}", knockout.name);
                tx.emit(ProgressionEvent::KnockoutCompleted {
                    knockout: knockout_id,
                    champion,
                });
            }
        }
    }
    Ok(())
}

fn round_mut(
    knockout: &mut Knockout,
    index: usize,
) -> TournamentResult<&mut crate::bracket::KnockoutRound> {
    let knockout_id = knockout.id;
    knockout.rounds.get_mut(index).ok_or_else(|| {
        TournamentError::DataIntegrity(format!("knockout {knockout_id} has no round {index}"))
    })
}

/// Set one side's lineup for a squad match
pub(crate) async fn submit_lineup(
    tx: &mut Transition<'_>,
    match_id: MatchId,
    side: Side,
    lineup: Lineup,
) -> TournamentResult<bool> {
    let mut record = tx.load::<Match>(match_id).await?;
    if record.is_completed() {
        return Err(TournamentError::InvalidState {
            entity: "match",
            expected: "open".to_string(),
            actual: "Completed".to_string(),
        });
    }

    let sub_contests_ready = record
        .composite
        .get_or_insert_with(Composite::default)
        .set_lineup(side, lineup)?;
    tx.update(&record)?;

    if sub_contests_ready {
        log::info!("{} ({match_id}) lineups complete", record.label);
    }
    tx.emit(ProgressionEvent::LineupSubmitted {
        match_id,
        side,
        sub_contests_ready,
    });
    Ok(true)
}

/// Record one sub-contest of a squad match, completing the match with the last one
///
/// Returns `false` when that sub-contest already had a result.
pub(crate) async fn record_sub_contest(
    tx: &mut Transition<'_>,
    match_id: MatchId,
    kind: SubContestKind,
    score_a: u32,
    score_b: u32,
    tie_break: Option<ParticipantId>,
    at: DateTime<Utc>,
) -> TournamentResult<bool> {
    let mut record = tx.load::<Match>(match_id).await?;
    let allows_draw = record.container.allows_draws();

    let composite = record.composite.as_mut().ok_or_else(|| TournamentError::InvalidState {
        entity: "squad match",
        expected: "both lineups submitted".to_string(),
        actual: "no lineups".to_string(),
    })?;

    if composite
        .sub_contests
        .iter()
        .any(|contest| contest.kind == kind && contest.completed)
    {
        log::debug!("{kind} of match {match_id} already recorded");
        return Ok(false);
    }

    let winner = composite.record(match_id, kind, (score_a, score_b), allows_draw, tie_break)?;
    let (points_a, points_b) = composite.points();
    let complete = composite.is_complete();

    record.score_a = points_a;
    record.score_b = points_b;
    tx.emit(ProgressionEvent::SubContestRecorded {
        match_id,
        kind,
        winner,
    });

    if complete {
        finish_match(tx, record, points_a, points_b, None, at).await?;
    } else {
        tx.update(&record)?;
    }
    Ok(true)
}
