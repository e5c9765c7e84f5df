//! Registration, fixture generation and publishing.

use super::models::{ProgressionEvent, Tournament, TournamentStatus, Visibility};
use super::transition::Transition;
use crate::bracket::{Knockout, RoundStage, Series};
use crate::errors::{TournamentError, TournamentResult};
use crate::fixtures::round_robin;
use crate::ids::{KnockoutId, LeagueId, MatchId, ParticipantId, SeriesId, TournamentId};
use crate::league::League;
use crate::matches::{Match, MatchContainer, MatchStatus, RoundTag, StageStatus};
use crate::standings::compute_standings;

pub(crate) async fn register(
    tx: &mut Transition<'_>,
    league_id: LeagueId,
    participant: ParticipantId,
) -> TournamentResult<bool> {
    let mut league = tx.load::<League>(league_id).await?;
    league.register(participant)?;
    tx.update(&league)?;

    log::info!("Registered {participant} in {}", league.name);
    tx.emit(ProgressionEvent::ParticipantRegistered {
        league: league_id,
        participant,
    });
    Ok(true)
}

/// Build the league schedule and take the tournament live
pub(crate) async fn generate_fixtures(
    tx: &mut Transition<'_>,
    league_id: LeagueId,
) -> TournamentResult<bool> {
    let mut league = tx.load::<League>(league_id).await?;
    if league.status != StageStatus::Upcoming {
        return Err(TournamentError::InvalidState {
            entity: "league",
            expected: StageStatus::Upcoming.to_string(),
            actual: league.status.to_string(),
        });
    }

    let mut tournament = tx.load::<Tournament>(league.tournament).await?;
    if tournament.status == TournamentStatus::Completed {
        return Err(TournamentError::InvalidState {
            entity: "tournament",
            expected: "Upcoming or Live".to_string(),
            actual: tournament.status.to_string(),
        });
    }

    let needed = tournament.format.min_participants();
    if league.participants.len() < needed {
        return Err(TournamentError::InsufficientParticipants {
            needed,
            current: league.participants.len(),
        });
    }

    let pairings = round_robin(&league.participants, league.legs)?;
    let rounds = pairings.iter().map(|pairing| pairing.round).max().unwrap_or(0);

    let mut created = Vec::with_capacity(pairings.len());
    for pairing in pairings {
        let game = Match::new(
            pairing.side_a,
            pairing.side_b,
            RoundTag::League {
                round: pairing.round,
            },
            format!("Round {}", pairing.round),
            MatchContainer::League(league_id),
            MatchStatus::Unpublished,
        );
        tx.insert(&game)?;
        created.push(game.id);
    }

    league.matches = created;
    league.status = StageStatus::Active;
    tx.update(&league)?;

    if tournament.status == TournamentStatus::Upcoming {
        tournament.status = TournamentStatus::Live;
        tx.update(&tournament)?;
    }

    log::info!(
        "Generated {} fixtures over {rounds} rounds for {}",
        league.matches.len(),
        league.name
    );
    tx.emit(ProgressionEvent::FixturesGenerated {
        league: league_id,
        matches: league.matches.len(),
        rounds,
    });
    Ok(true)
}

/// Move every unpublished match of a league round to Scheduled
pub(crate) async fn publish_league_round(
    tx: &mut Transition<'_>,
    league_id: LeagueId,
    round: u32,
) -> TournamentResult<bool> {
    let league = tx.load::<League>(league_id).await?;
    let mut matches = tx.load_all::<Match>(&league.matches).await?;

    let mut published = Vec::new();
    for game in matches.iter_mut() {
        if game.round == (RoundTag::League { round }) && game.status == MatchStatus::Unpublished {
            game.status = MatchStatus::Scheduled;
            tx.update(game)?;
            published.push(game.id);
        }
    }

    if published.is_empty() {
        return Err(TournamentError::NothingToPublish(format!(
            "round {round} of {}",
            league.name
        )));
    }

    // Bump the league so publishing serializes with completions
    tx.update(&league)?;
    log::info!("Published {} matches of round {round} in {}", published.len(), league.name);
    tx.emit(ProgressionEvent::MatchesPublished { matches: published });
    Ok(true)
}

/// Publish a knockout round, including any series it holds
pub(crate) async fn publish_knockout_round(
    tx: &mut Transition<'_>,
    knockout_id: KnockoutId,
    stage: RoundStage,
) -> TournamentResult<bool> {
    let mut knockout = tx.load::<Knockout>(knockout_id).await?;
    let round = knockout
        .round_index(stage)
        .map(|index| knockout.rounds[index].clone())
        .ok_or_else(|| TournamentError::InvalidState {
            entity: "knockout round",
            expected: "declared".to_string(),
            actual: format!("no {} in {}", stage.name(), knockout.name),
        })?;

    let mut published = publish_matches(tx, &round.matches).await?;
    for series_id in &round.series {
        published.extend(activate_series(tx, *series_id).await?);
    }

    if published.is_empty() {
        return Err(TournamentError::NothingToPublish(format!(
            "{} of {}",
            round.name, knockout.name
        )));
    }

    if knockout.status == StageStatus::Upcoming {
        knockout.status = StageStatus::Active;
    }
    tx.update(&knockout)?;
    log::info!("Published {} of {}", round.name, knockout.name);
    tx.emit(ProgressionEvent::MatchesPublished { matches: published });
    Ok(true)
}

/// Activate a series and schedule its unpublished games
pub(crate) async fn publish_series(
    tx: &mut Transition<'_>,
    series_id: SeriesId,
) -> TournamentResult<bool> {
    let series = tx.load::<Series>(series_id).await?;
    let published = activate_series(tx, series_id).await?;
    if published.is_empty() && series.status != StageStatus::Upcoming {
        return Err(TournamentError::NothingToPublish(series.name.clone()));
    }

    tx.emit(ProgressionEvent::MatchesPublished { matches: published });
    Ok(true)
}

async fn publish_matches(
    tx: &mut Transition<'_>,
    ids: &[MatchId],
) -> TournamentResult<Vec<MatchId>> {
    let mut published = Vec::new();
    for mut game in tx.load_all::<Match>(ids).await? {
        if game.status == MatchStatus::Unpublished {
            game.status = MatchStatus::Scheduled;
            tx.update(&game)?;
            published.push(game.id);
        }
    }
    Ok(published)
}

async fn activate_series(
    tx: &mut Transition<'_>,
    series_id: SeriesId,
) -> TournamentResult<Vec<MatchId>> {
    let mut series = tx.load::<Series>(series_id).await?;
    let published = publish_matches(tx, &series.matches).await?;

    if series.status == StageStatus::Upcoming {
        series.status = StageStatus::Active;
        log::info!("{} is live", series.name);
        tx.emit(ProgressionEvent::SeriesActivated { series: series_id });
    }
    tx.update(&series)?;
    Ok(published)
}

/// Returns `false` when the tournament already had that visibility
pub(crate) async fn set_visibility(
    tx: &mut Transition<'_>,
    tournament_id: TournamentId,
    visibility: Visibility,
) -> TournamentResult<bool> {
    let mut tournament = tx.load::<Tournament>(tournament_id).await?;
    if tournament.visibility == visibility {
        return Ok(false);
    }

    tournament.visibility = visibility;
    tx.update(&tournament)?;
    tx.emit(ProgressionEvent::VisibilityChanged {
        tournament: tournament_id,
        visibility,
    });
    Ok(true)
}

/// Recompute the cached final table of a completed league
pub(crate) async fn refresh_standings(
    tx: &mut Transition<'_>,
    league_id: LeagueId,
) -> TournamentResult<bool> {
    let mut league = tx.load::<League>(league_id).await?;
    if league.status != StageStatus::Completed {
        return Err(TournamentError::InvalidState {
            entity: "league",
            expected: StageStatus::Completed.to_string(),
            actual: league.status.to_string(),
        });
    }

    let matches: Vec<Match> = tx
        .load_all::<Match>(&league.matches)
        .await?
        .into_iter()
        .map(|game| game.into_inner())
        .collect();
    league.standings_cache = Some(compute_standings(&league.participants, &matches));
    tx.update(&league)?;

    log::debug!("Refreshed standings cache of {}", league.name);
    tx.emit(ProgressionEvent::StandingsRefreshed { league: league_id });
    Ok(true)
}
