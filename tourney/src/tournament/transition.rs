use super::models::ProgressionEvent;
use crate::config::EngineConfig;
use crate::db::{Changeset, CommitOutcome, Record, Repository, Versioned};
use crate::errors::{TournamentError, TournamentResult};

/// Reads and staged writes of one attempt at an operation
///
/// Nothing reaches the store until [`Transition::commit`], which applies every
/// staged write atomically or reports that another writer got there first.
pub(crate) struct Transition<'a> {
    repo: &'a Repository,
    pub(crate) config: &'a EngineConfig,
    changes: Changeset,
    events: Vec<ProgressionEvent>,
}

impl<'a> Transition<'a> {
    pub(crate) fn new(repo: &'a Repository, config: &'a EngineConfig) -> Self {
        Self {
            repo,
            config,
            changes: Changeset::new(),
            events: Vec::new(),
        }
    }

    /// Load a record that must exist
    pub(crate) async fn load<R: Record>(&self, id: R::Id) -> TournamentResult<Versioned<R>> {
        self.repo
            .get::<R>(id)
            .await?
            .ok_or_else(|| TournamentError::NotFound {
                kind: R::KIND,
                id: id.into(),
            })
    }

    /// Load records another record references; a dangling reference is an integrity fault
    pub(crate) async fn load_all<R: Record>(
        &self,
        ids: &[R::Id],
    ) -> TournamentResult<Vec<Versioned<R>>> {
        let records = self.repo.get_many::<R>(ids).await?;
        if records.len() != ids.len() {
            return Err(TournamentError::DataIntegrity(format!(
                "{} of {} referenced {} records are missing",
                ids.len() - records.len(),
                ids.len(),
                R::KIND
            )));
        }
        Ok(records)
    }

    /// Load whichever of the records exist
    pub(crate) async fn load_existing<R: Record>(
        &self,
        ids: &[R::Id],
    ) -> TournamentResult<Vec<Versioned<R>>> {
        Ok(self.repo.get_many::<R>(ids).await?)
    }

    pub(crate) fn insert<R: Record>(&mut self, record: &R) -> TournamentResult<()> {
        self.changes.insert(record)?;
        Ok(())
    }

    pub(crate) fn update<R: Record>(&mut self, record: &Versioned<R>) -> TournamentResult<()> {
        self.changes.update(record)?;
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: ProgressionEvent) {
        self.events.push(event);
    }

    /// Commit staged writes; `None` means a guard failed and the attempt must be retried
    pub(crate) async fn commit(self) -> TournamentResult<Option<Vec<ProgressionEvent>>> {
        let writes = self.changes.len();
        match self.repo.commit(self.changes).await? {
            CommitOutcome::Committed => {
                log::debug!("Committed {writes} writes");
                Ok(Some(self.events))
            }
            CommitOutcome::Conflict { kind, id } => {
                log::debug!("Commit of {writes} writes lost a race on {kind} {id}");
                Ok(None)
            }
        }
    }
}
