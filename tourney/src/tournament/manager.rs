//! Tournament manager: the entry points of the progression engine.

use super::lifecycle;
use super::models::{NewTournament, Progress, StageRef, Tournament, TournamentFormat, Visibility};
use super::progression;
use super::transition::Transition;
use crate::bracket::{Knockout, RoundStage, Series};
use crate::config::EngineConfig;
use crate::db::{Changeset, CommitOutcome, Record, RecordStore, Repository};
use crate::errors::{TournamentError, TournamentResult};
use crate::ids::{KnockoutId, LeagueId, MatchId, ParticipantId, SeriesId, Side, TournamentId};
use crate::league::League;
use crate::matches::{
    HistoryEntry, Lineup, Match, MatchContainer, StageStatus, SubContestKind, history_of,
};
use crate::points::{PointsRecord, SeedingEntry, final_seeding};
use crate::standings::{StandingsRow, compute_standings};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A state-changing request, replayable against fresh state on every attempt
#[derive(Debug, Clone, Copy)]
enum Operation {
    Register {
        league: LeagueId,
        participant: ParticipantId,
    },
    GenerateFixtures {
        league: LeagueId,
    },
    CompleteMatch {
        match_id: MatchId,
        score_a: u32,
        score_b: u32,
        tie_break: Option<ParticipantId>,
        at: DateTime<Utc>,
    },
    PublishLeagueRound {
        league: LeagueId,
        round: u32,
    },
    PublishKnockoutRound {
        knockout: KnockoutId,
        stage: RoundStage,
    },
    PublishSeries {
        series: SeriesId,
    },
    SetVisibility {
        tournament: TournamentId,
        visibility: Visibility,
    },
    SubmitLineup {
        match_id: MatchId,
        side: Side,
        lineup: Lineup,
    },
    RecordSubContest {
        match_id: MatchId,
        kind: SubContestKind,
        score_a: u32,
        score_b: u32,
        tie_break: Option<ParticipantId>,
        at: DateTime<Utc>,
    },
    RefreshStandings {
        league: LeagueId,
    },
}

impl Operation {
    /// Stage this operation's writes; `false` means it had already been applied
    async fn stage(self, tx: &mut Transition<'_>) -> TournamentResult<bool> {
        match self {
            Operation::Register {
                league,
                participant,
            } => lifecycle::register(tx, league, participant).await,
            Operation::GenerateFixtures { league } => {
                lifecycle::generate_fixtures(tx, league).await
            }
            Operation::CompleteMatch {
                match_id,
                score_a,
                score_b,
                tie_break,
                at,
            } => progression::complete_match(tx, match_id, score_a, score_b, tie_break, at).await,
            Operation::PublishLeagueRound { league, round } => {
                lifecycle::publish_league_round(tx, league, round).await
            }
            Operation::PublishKnockoutRound { knockout, stage } => {
                lifecycle::publish_knockout_round(tx, knockout, stage).await
            }
            Operation::PublishSeries { series } => lifecycle::publish_series(tx, series).await,
            Operation::SetVisibility {
                tournament,
                visibility,
            } => lifecycle::set_visibility(tx, tournament, visibility).await,
            Operation::SubmitLineup {
                match_id,
                side,
                lineup,
            } => progression::submit_lineup(tx, match_id, side, lineup).await,
            Operation::RecordSubContest {
                match_id,
                kind,
                score_a,
                score_b,
                tie_break,
                at,
            } => {
                progression::record_sub_contest(
                    tx, match_id, kind, score_a, score_b, tie_break, at,
                )
                .await
            }
            Operation::RefreshStandings { league } => {
                lifecycle::refresh_standings(tx, league).await
            }
        }
    }
}

/// Tournament manager
///
/// Every state-changing call reads the records it needs, stages its writes
/// and commits them atomically with version guards. A lost race re-runs the
/// whole operation against fresh state, up to `max_commit_attempts` times.
#[derive(Clone)]
pub struct TournamentManager {
    repo: Repository,
    config: EngineConfig,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(store: Arc<dyn RecordStore>, config: EngineConfig) -> Self {
        Self {
            repo: Repository::new(store),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Create a tournament together with its league
    pub async fn create_tournament(&self, request: NewTournament) -> TournamentResult<Tournament> {
        request.format.validate(request.max_participants)?;

        let mut tournament = Tournament::new(request.name, request.format);
        let league = League::new(
            tournament.id,
            format!("{} League", tournament.name),
            request.max_participants,
            request.legs,
        );
        tournament.stages.push(StageRef::League(league.id));

        let mut changes = Changeset::new();
        changes.insert(&tournament)?;
        changes.insert(&league)?;

        match self.repo.commit(changes).await? {
            CommitOutcome::Committed => {
                log::info!(
                    "Created tournament {} ({}) as {:?}",
                    tournament.name,
                    tournament.id,
                    tournament.format
                );
                Ok(tournament)
            }
            CommitOutcome::Conflict { kind, id } => {
                log::warn!("Tournament creation collided with existing {kind} {id}");
                Err(TournamentError::ConcurrentUpdate { attempts: 1 })
            }
        }
    }

    /// Register a participant in a league that is still upcoming
    pub async fn register_participant(
        &self,
        league: LeagueId,
        participant: ParticipantId,
    ) -> TournamentResult<Progress> {
        self.execute(Operation::Register {
            league,
            participant,
        })
        .await
    }

    /// Generate the league's round-robin fixtures and take the tournament live
    pub async fn generate_fixtures(&self, league: LeagueId) -> TournamentResult<Progress> {
        self.execute(Operation::GenerateFixtures { league }).await
    }

    /// Record a final score at `at` and advance whatever follows from it
    ///
    /// A level score in a knockout or series game needs `tie_break` naming one
    /// of the two sides; it is ignored otherwise. Completing an already
    /// completed match returns [`Progress::AlreadyApplied`] and writes nothing.
    ///
    /// # Errors
    ///
    /// - `TieBreakRequired` / `InvalidTieBreak` for an undecided knockout score
    /// - `ConcurrentUpdate` if every attempt lost a race
    pub async fn on_match_completed(
        &self,
        match_id: MatchId,
        score_a: u32,
        score_b: u32,
        tie_break: Option<ParticipantId>,
        at: DateTime<Utc>,
    ) -> TournamentResult<Progress> {
        self.execute(Operation::CompleteMatch {
            match_id,
            score_a,
            score_b,
            tie_break,
            at,
        })
        .await
    }

    pub async fn publish_league_round(
        &self,
        league: LeagueId,
        round: u32,
    ) -> TournamentResult<Progress> {
        self.execute(Operation::PublishLeagueRound { league, round })
            .await
    }

    pub async fn publish_knockout_round(
        &self,
        knockout: KnockoutId,
        stage: RoundStage,
    ) -> TournamentResult<Progress> {
        self.execute(Operation::PublishKnockoutRound { knockout, stage })
            .await
    }

    pub async fn publish_series(&self, series: SeriesId) -> TournamentResult<Progress> {
        self.execute(Operation::PublishSeries { series }).await
    }

    pub async fn set_visibility(
        &self,
        tournament: TournamentId,
        visibility: Visibility,
    ) -> TournamentResult<Progress> {
        self.execute(Operation::SetVisibility {
            tournament,
            visibility,
        })
        .await
    }

    /// Submit one side's lineup for a squad match
    pub async fn submit_lineup(
        &self,
        match_id: MatchId,
        side: Side,
        lineup: Lineup,
    ) -> TournamentResult<Progress> {
        self.execute(Operation::SubmitLineup {
            match_id,
            side,
            lineup,
        })
        .await
    }

    /// Record a squad sub-contest; the last one completes the match
    pub async fn record_sub_contest(
        &self,
        match_id: MatchId,
        kind: SubContestKind,
        score_a: u32,
        score_b: u32,
        tie_break: Option<ParticipantId>,
        at: DateTime<Utc>,
    ) -> TournamentResult<Progress> {
        self.execute(Operation::RecordSubContest {
            match_id,
            kind,
            score_a,
            score_b,
            tie_break,
            at,
        })
        .await
    }

    pub async fn refresh_standings_cache(&self, league: LeagueId) -> TournamentResult<Progress> {
        self.execute(Operation::RefreshStandings { league }).await
    }

    async fn execute(&self, operation: Operation) -> TournamentResult<Progress> {
        let attempts = self.config.max_commit_attempts;

        for attempt in 1..=attempts {
            let mut tx = Transition::new(&self.repo, &self.config);
            if !operation.stage(&mut tx).await? {
                log::debug!("{operation:?} already applied");
                return Ok(Progress::AlreadyApplied);
            }

            match tx.commit().await? {
                Some(events) => return Ok(Progress::Applied(events)),
                None => log::warn!("{operation:?} conflicted (attempt {attempt}/{attempts})"),
            }
        }

        Err(TournamentError::ConcurrentUpdate { attempts })
    }

    async fn fetch<R: Record>(&self, id: R::Id) -> TournamentResult<R> {
        self.repo
            .get::<R>(id)
            .await?
            .map(|record| record.into_inner())
            .ok_or_else(|| TournamentError::NotFound {
                kind: R::KIND,
                id: id.into(),
            })
    }

    pub async fn tournament(&self, id: TournamentId) -> TournamentResult<Tournament> {
        self.fetch(id).await
    }

    pub async fn league(&self, id: LeagueId) -> TournamentResult<League> {
        self.fetch(id).await
    }

    pub async fn knockout(&self, id: KnockoutId) -> TournamentResult<Knockout> {
        self.fetch(id).await
    }

    pub async fn series(&self, id: SeriesId) -> TournamentResult<Series> {
        self.fetch(id).await
    }

    pub async fn get_match(&self, id: MatchId) -> TournamentResult<Match> {
        self.fetch(id).await
    }

    /// Matches of a container in schedule order
    pub async fn matches(&self, container: MatchContainer) -> TournamentResult<Vec<Match>> {
        let ids = match container {
            MatchContainer::League(id) => self.league(id).await?.matches,
            MatchContainer::Knockout(id) => {
                let knockout = self.knockout(id).await?;
                let mut ids = knockout.match_ids();
                for series in self.repo.get_many::<Series>(&knockout.series_ids()).await? {
                    ids.extend(series.matches.iter().copied());
                }
                ids
            }
            MatchContainer::Series(id) => self.series(id).await?.matches,
        };

        Ok(self
            .repo
            .get_many::<Match>(&ids)
            .await?
            .into_iter()
            .map(|record| record.into_inner())
            .collect())
    }

    /// Every match a participant has in a tournament, stage by stage
    ///
    /// Fixtures not yet played are listed as pending, so the history is
    /// complete from the moment the league schedule exists.
    pub async fn history(
        &self,
        tournament: TournamentId,
        participant: ParticipantId,
    ) -> TournamentResult<Vec<HistoryEntry>> {
        let tournament = self.tournament(tournament).await?;

        let mut entries = Vec::new();
        for stage in &tournament.stages {
            let container = match *stage {
                StageRef::League(id) => MatchContainer::League(id),
                StageRef::Knockout(id) => MatchContainer::Knockout(id),
            };
            entries.extend(history_of(participant, &self.matches(container).await?));
        }
        Ok(entries)
    }

    /// Current standings of a container's participants
    ///
    /// Participants without a completed match still get a zeroed row.
    pub async fn compute_standings(
        &self,
        container: MatchContainer,
    ) -> TournamentResult<Vec<StandingsRow>> {
        let participants = match container {
            MatchContainer::League(id) => self.league(id).await?.participants,
            MatchContainer::Knockout(id) => self.knockout(id).await?.seeds,
            MatchContainer::Series(id) => {
                let series = self.series(id).await?;
                vec![series.player1, series.player2]
            }
        };
        let matches = self.matches(container).await?;
        Ok(compute_standings(&participants, &matches))
    }

    /// Circuit points of a tournament's league participants, in registration order
    pub async fn points(&self, tournament: TournamentId) -> TournamentResult<Vec<PointsRecord>> {
        let tournament = self.tournament(tournament).await?;
        let Some(league_id) = tournament.league() else {
            return Ok(Vec::new());
        };
        let league = self.league(league_id).await?;

        let ids: Vec<_> = league
            .participants
            .iter()
            .map(|&participant| PointsRecord::id_for(tournament.id, participant))
            .collect();
        Ok(self
            .repo
            .get_many::<PointsRecord>(&ids)
            .await?
            .into_iter()
            .map(|record| record.into_inner())
            .collect())
    }

    /// Seeding of the gauntlet finishers for the page playoff
    ///
    /// # Errors
    ///
    /// - `UnsupportedOperation` unless the tournament is a champions circuit
    /// - `PhaseNotFinalized` before the league and gauntlet have completed
    /// - `IncompletePoints` if a finisher lacks either phase's points
    pub async fn compute_final_seeding(
        &self,
        tournament: TournamentId,
    ) -> TournamentResult<Vec<SeedingEntry>> {
        let tournament = self.tournament(tournament).await?;
        if !matches!(tournament.format, TournamentFormat::ChampionsCircuit { .. }) {
            return Err(TournamentError::UnsupportedOperation(format!(
                "final seeding of {:?} tournament {}",
                tournament.format, tournament.id
            )));
        }

        let league_id = tournament.league().ok_or_else(|| {
            TournamentError::DataIntegrity(format!("tournament {} has no league", tournament.id))
        })?;
        let league = self.league(league_id).await?;
        let phase1_standings = league
            .standings_cache
            .ok_or_else(|| TournamentError::PhaseNotFinalized(league.name.clone()))?;

        let gauntlet_id = tournament
            .knockouts()
            .first()
            .copied()
            .ok_or_else(|| TournamentError::PhaseNotFinalized("gauntlet".to_string()))?;
        let gauntlet = self.knockout(gauntlet_id).await?;
        if gauntlet.status != StageStatus::Completed {
            return Err(TournamentError::PhaseNotFinalized(gauntlet.name));
        }

        let ids: Vec<_> = gauntlet
            .placements
            .iter()
            .map(|&participant| PointsRecord::id_for(tournament.id, participant))
            .collect();
        let records: Vec<PointsRecord> = self
            .repo
            .get_many::<PointsRecord>(&ids)
            .await?
            .into_iter()
            .map(|record| record.into_inner())
            .collect();

        final_seeding(&gauntlet.placements, &records, &phase1_standings)
    }
}
