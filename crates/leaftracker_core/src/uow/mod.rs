//! Unit of Work over the source, species and batch repositories.
//!
//! # Responsibility
//! - Own one repository per aggregate type for one logical operation.
//! - Commit buffered aggregates in a fixed order: sources, species, batches.
//! - Discard uncommitted work on rollback, scope exit and drop.
//!
//! # Invariants
//! - Rollback never touches the store and is safe to repeat.
//! - Commit is not atomic across aggregate types: a failure leaves earlier
//!   kinds persisted and reports them in `CommitError::committed`.

use crate::document::{DocumentStore, StoreError};
use crate::model::{Batch, SourceOfStock, Species};
use crate::repo::{
    batch_repository, source_repository, species_repository, BatchRepository, PartialWrite,
    SourceOfStockRepository, SpeciesRepository,
};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod indexes;

pub use indexes::{create_all_indexes, index_definitions, refresh_all_indexes, IndexDefinition};

/// Aggregate type handled by a unit of work, in commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    SourceOfStock,
    Species,
    Batch,
}

impl Display for AggregateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SourceOfStock => "source_of_stock",
            Self::Species => "species",
            Self::Batch => "batch",
        };
        f.write_str(name)
    }
}

/// Aggregates persisted by a commit, references assigned, in add order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Committed {
    pub sources: Vec<SourceOfStock>,
    pub species: Vec<Species>,
    pub batches: Vec<Batch>,
}

impl Committed {
    pub fn len(&self) -> usize {
        self.sources.len() + self.species.len() + self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Commit stopped partway; `committed` holds what was already saved.
#[derive(Debug)]
pub struct CommitError {
    pub committed: Committed,
    pub failed: AggregateKind,
    pub error: StoreError,
}

impl Display for CommitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "commit failed while writing {} after {} aggregate(s) were saved: {}",
            self.failed,
            self.committed.len(),
            self.error
        )
    }
}

impl Error for CommitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

/// Coordinates pending writes across the three aggregate repositories.
pub struct UnitOfWork<'s> {
    sources: SourceOfStockRepository<'s>,
    species: SpeciesRepository<'s>,
    batches: BatchRepository<'s>,
}

impl<'s> UnitOfWork<'s> {
    pub fn new(
        sources: SourceOfStockRepository<'s>,
        species: SpeciesRepository<'s>,
        batches: BatchRepository<'s>,
    ) -> Self {
        Self {
            sources,
            species,
            batches,
        }
    }

    /// Builds the standard repositories over one store per aggregate type.
    pub fn from_stores(
        sources: &'s dyn DocumentStore,
        species: &'s dyn DocumentStore,
        batches: &'s dyn DocumentStore,
    ) -> Self {
        Self::new(
            source_repository(sources),
            species_repository(species),
            batch_repository(batches),
        )
    }

    pub fn sources(&mut self) -> &mut SourceOfStockRepository<'s> {
        &mut self.sources
    }

    pub fn species(&mut self) -> &mut SpeciesRepository<'s> {
        &mut self.species
    }

    pub fn batches(&mut self) -> &mut BatchRepository<'s> {
        &mut self.batches
    }

    /// Whether any repository still buffers uncommitted aggregates.
    pub fn has_pending(&self) -> bool {
        self.sources.writer().pending() > 0
            || self.species.writer().pending() > 0
            || self.batches.writer().pending() > 0
    }

    /// Runs `work` inside a scope that always rolls back on exit.
    ///
    /// Work that `work` did not `commit` is discarded, whether it returns
    /// `Ok` or `Err`.
    pub fn scope<T, E>(&mut self, work: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let outcome = work(self);
        self.rollback();
        outcome
    }

    /// Writes sources, then species, then batches.
    ///
    /// # Errors
    /// Returns `CommitError` at the first failing store write. Kinds written
    /// before it stay persisted; the failing kind keeps its unwritten
    /// aggregates buffered and later kinds are not attempted.
    pub fn commit(&mut self) -> Result<Committed, CommitError> {
        let mut committed = Committed::default();

        match self.sources.writer_mut().write() {
            Ok(written) => committed.sources = written,
            Err(partial) => {
                return Err(fail(committed, AggregateKind::SourceOfStock, partial, |c, w| {
                    c.sources = w;
                }));
            }
        }
        match self.species.writer_mut().write() {
            Ok(written) => committed.species = written,
            Err(partial) => {
                return Err(fail(committed, AggregateKind::Species, partial, |c, w| {
                    c.species = w;
                }));
            }
        }
        match self.batches.writer_mut().write() {
            Ok(written) => committed.batches = written,
            Err(partial) => {
                return Err(fail(committed, AggregateKind::Batch, partial, |c, w| {
                    c.batches = w;
                }));
            }
        }

        info!(
            "event=uow_commit module=uow status=ok sources={} species={} batches={}",
            committed.sources.len(),
            committed.species.len(),
            committed.batches.len()
        );
        Ok(committed)
    }

    /// Discards every buffered aggregate. Never touches the store.
    pub fn rollback(&mut self) {
        let discarded = self.sources.writer_mut().discard()
            + self.species.writer_mut().discard()
            + self.batches.writer_mut().discard();
        if discarded > 0 {
            debug!("event=uow_rollback module=uow status=ok discarded={discarded}");
        }
    }
}

fn fail<A>(
    mut committed: Committed,
    failed: AggregateKind,
    partial: PartialWrite<A>,
    record: impl FnOnce(&mut Committed, Vec<A>),
) -> CommitError {
    warn!(
        "event=uow_commit module=uow status=error failed={failed} saved_in_failed_kind={} error={}",
        partial.written.len(),
        partial.error
    );
    record(&mut committed, partial.written);
    CommitError {
        committed,
        failed,
        error: partial.error,
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if self.has_pending() {
            warn!("event=uow_drop module=uow status=discarded reason=not_committed");
            self.rollback();
        }
    }
}
