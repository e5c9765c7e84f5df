//! Stage-to-stage transitions.
//!
//! When a league or knockout completes, the tournament format decides what
//! comes next: the champion is crowned, or a later stage is seeded from the
//! finishing order. A stage is appended at most once; a replayed completion
//! finds it already in `Tournament::stages` and stops.

use super::models::{
    GAUNTLET_ENTRANTS, ProgressionEvent, StageRef, Tournament, TournamentFormat, TournamentStatus,
};
use super::progression::apply_actions;
use super::transition::Transition;
use crate::bracket::{
    BracketFormat, BracketRules, Gauntlet, Knockout, PAGE_PLAYOFF_ENTRANTS, PagePlayoff,
    SingleElimination,
};
use crate::errors::{TournamentError, TournamentResult};
use crate::ids::{KnockoutId, ParticipantId, TournamentId};
use crate::league::League;
use crate::matches::{Match, StageStatus};
use crate::points::{Phase, PointsRecord, final_seeding};
use crate::standings::compute_standings;

/// Close a league whose every match is complete and start what follows it
pub(crate) async fn finish_league(
    tx: &mut Transition<'_>,
    league: &mut League,
    matches: &[Match],
) -> TournamentResult<()> {
    let standings = compute_standings(&league.participants, matches);
    let order: Vec<ParticipantId> = standings.iter().map(|row| row.participant).collect();

    league.standings_cache = Some(standings);
    league.status = StageStatus::Completed;
    log::info!("{} completed with {} matches", league.name, matches.len());
    tx.emit(ProgressionEvent::LeagueCompleted { league: league.id });

    let mut tournament = tx.load::<Tournament>(league.tournament).await?;
    if tournament.stages.len() > 1 {
        log::debug!("Tournament {} already moved past its league", tournament.id);
        return Ok(());
    }

    match tournament.format {
        TournamentFormat::LeagueOnly => {
            let champion = top(&order, 1)?[0];
            complete_tournament(tx, &mut tournament, champion);
        }
        TournamentFormat::LeagueKnockout { bracket_size } => {
            let seeds = top(&order, bracket_size)?;
            seed_knockout(tx, &mut tournament, "Knockout", SingleElimination.into(), seeds)?;
        }
        TournamentFormat::ChampionsCircuit { gauntlet_best_of } => {
            let awards = tx.config.placement_points.award(&order);
            upsert_points(tx, tournament.id, &awards, Phase::One).await?;

            let seeds = top(&order, GAUNTLET_ENTRANTS)?;
            let gauntlet = Gauntlet::new(gauntlet_best_of)?;
            seed_knockout(tx, &mut tournament, "Gauntlet", gauntlet.into(), seeds)?;
        }
    }

    tx.update(&tournament)
}

/// Follow up a completed knockout
pub(crate) async fn finish_knockout(
    tx: &mut Transition<'_>,
    knockout: &Knockout,
) -> TournamentResult<()> {
    let mut tournament = tx.load::<Tournament>(knockout.tournament).await?;
    let champion = knockout.champion.ok_or_else(|| {
        TournamentError::DataIntegrity(format!(
            "knockout {} completed without a champion",
            knockout.id
        ))
    })?;

    match (tournament.format, knockout.format) {
        (TournamentFormat::LeagueKnockout { .. }, BracketFormat::SingleElimination(_))
        | (TournamentFormat::ChampionsCircuit { .. }, BracketFormat::PagePlayoff(_)) => {
            complete_tournament(tx, &mut tournament, champion);
        }

        (TournamentFormat::ChampionsCircuit { .. }, BracketFormat::Gauntlet(_)) => {
            if tournament.stages.len() > 2 {
                log::debug!("Tournament {} already seeded its playoff", tournament.id);
                return Ok(());
            }

            let awards = tx.config.placement_points.award(&knockout.placements);
            let records = upsert_points(tx, tournament.id, &awards, Phase::Two).await?;

            let league_id = tournament.league().ok_or_else(|| {
                TournamentError::DataIntegrity(format!(
                    "tournament {} has no league",
                    tournament.id
                ))
            })?;
            let league = tx.load::<League>(league_id).await?;
            let phase1_standings = league
                .standings_cache
                .as_deref()
                .ok_or_else(|| TournamentError::PhaseNotFinalized(league.name.clone()))?;

            let seeding = final_seeding(&knockout.placements, &records, phase1_standings)?;
            let order: Vec<ParticipantId> =
                seeding.iter().map(|entry| entry.participant).collect();
            let seeds = top(&order, PAGE_PLAYOFF_ENTRANTS)?;
            seed_knockout(tx, &mut tournament, "Page Playoff", PagePlayoff.into(), seeds)?;
        }

        (format, bracket) => {
            return Err(TournamentError::DataIntegrity(format!(
                "{bracket:?} knockout cannot follow a {format:?} tournament"
            )));
        }
    }

    tx.update(&tournament)
}

/// Create a knockout stage, open its first round and append it to the tournament
pub(crate) fn seed_knockout(
    tx: &mut Transition<'_>,
    tournament: &mut Tournament,
    name: &str,
    format: BracketFormat,
    seeds: Vec<ParticipantId>,
) -> TournamentResult<KnockoutId> {
    let name = format!("{} {name}", tournament.name);
    let mut knockout = Knockout::new(tournament.id, name, format, seeds)?;
    let opening = format.opening(&knockout.seeds);
    apply_actions(tx, &mut knockout, opening)?;
    tx.insert(&knockout)?;

    log::info!(
        "Seeded {} with {} participants",
        knockout.name,
        knockout.seeds.len()
    );
    tournament.stages.push(StageRef::Knockout(knockout.id));
    tx.emit(ProgressionEvent::StageSeeded {
        tournament: tournament.id,
        knockout: knockout.id,
        seeds: knockout.seeds.clone(),
    });
    Ok(knockout.id)
}

/// Write one phase's points, creating records where needed
async fn upsert_points(
    tx: &mut Transition<'_>,
    tournament: TournamentId,
    awards: &[(ParticipantId, u32)],
    phase: Phase,
) -> TournamentResult<Vec<PointsRecord>> {
    let ids: Vec<_> = awards
        .iter()
        .map(|&(participant, _)| PointsRecord::id_for(tournament, participant))
        .collect();
    let mut existing = tx.load_existing::<PointsRecord>(&ids).await?;

    let mut written = Vec::with_capacity(awards.len());
    for &(participant, points) in awards {
        match existing.iter_mut().find(|record| record.participant == participant) {
            Some(record) => {
                record.set(phase, points);
                tx.update(record)?;
                written.push(record.value.clone());
            }
            None => {
                let mut record = PointsRecord::new(tournament, participant);
                record.set(phase, points);
                tx.insert(&record)?;
                written.push(record);
            }
        }
    }

    log::info!("Awarded {phase} points to {} participants", awards.len());
    tx.emit(ProgressionEvent::PointsAwarded {
        tournament,
        phase,
        participants: awards.len(),
    });
    Ok(written)
}

fn complete_tournament(
    tx: &mut Transition<'_>,
    tournament: &mut Tournament,
    champion: ParticipantId,
) {
    tournament.status = TournamentStatus::Completed;
    tournament.champion = Some(champion);
    log::info!("{} completed, champion {champion}", tournament.name);
    tx.emit(ProgressionEvent::TournamentCompleted {
        tournament: tournament.id,
        champion,
    });
}

/// The first `n` of a finishing order
fn top(order: &[ParticipantId], n: usize) -> TournamentResult<Vec<ParticipantId>> {
    if order.len() < n {
        return Err(TournamentError::InsufficientParticipants {
            needed: n,
            current: order.len(),
        });
    }
    Ok(order[..n].to_vec())
}
