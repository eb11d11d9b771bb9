//! Use cases for sources of stock, species and batches.
//!
//! # Invariants
//! - Every use case commits at most once and rolls back on any early
//!   return, so a failed lookup never leaves buffered work behind.
//! - Lookups read committed state only.

use crate::model::{
    Aggregate, Batch, BatchType, MalformedTaxonName, Reference, SourceOfStock, SourceType,
    Species, Stock, StockSize,
};
use crate::repo::RepoError;
use crate::uow::{AggregateKind, CommitError, UnitOfWork};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Largest quantity the batch index can store in `stock.quantity`.
pub const MAX_STOCK_QUANTITY: u32 = i32::MAX as u32;

/// Service error for nursery use cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Batch refers to a source of stock that does not exist.
    InvalidSource(Reference),
    SpeciesNotFound(Reference),
    BatchNotFound(Reference),
    /// Quantity is zero or above `MAX_STOCK_QUANTITY`.
    InvalidQuantity,
    MalformedName(MalformedTaxonName),
    /// Commit succeeded but the store returned no usable reference.
    ReferenceNotAssigned(AggregateKind),
    Repo(RepoError),
    Commit(CommitError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSource(reference) => write!(f, "no such source: {reference}"),
            Self::SpeciesNotFound(reference) => write!(f, "no such species: {reference}"),
            Self::BatchNotFound(reference) => write!(f, "no such batch: {reference}"),
            Self::InvalidQuantity => write!(
                f,
                "stock quantity must be between 1 and {MAX_STOCK_QUANTITY}"
            ),
            Self::MalformedName(err) => write!(f, "{err}"),
            Self::ReferenceNotAssigned(kind) => {
                write!(f, "store did not assign a reference to the new {kind}")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::Commit(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedName(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Commit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CommitError> for ServiceError {
    fn from(value: CommitError) -> Self {
        Self::Commit(value)
    }
}

impl From<MalformedTaxonName> for ServiceError {
    fn from(value: MalformedTaxonName) -> Self {
        Self::MalformedName(value)
    }
}

/// Use-case facade owning the unit of work it runs in.
pub struct NurseryService<'s> {
    uow: UnitOfWork<'s>,
}

impl<'s> NurseryService<'s> {
    pub fn new(uow: UnitOfWork<'s>) -> Self {
        Self { uow }
    }

    pub fn unit_of_work(&mut self) -> &mut UnitOfWork<'s> {
        &mut self.uow
    }

    pub fn into_unit_of_work(self) -> UnitOfWork<'s> {
        self.uow
    }

    /// Records a new source of stock and returns its reference.
    pub fn add_source_of_stock(
        &mut self,
        name: &str,
        source_type: SourceType,
    ) -> ServiceResult<Reference> {
        let reference = self.uow.scope(|uow| {
            uow.sources().add(SourceOfStock::new(name, source_type));
            let committed = uow.commit()?;
            created_reference(&committed.sources, AggregateKind::SourceOfStock)
        })?;
        info!("event=source_add module=service status=ok reference={reference}");
        Ok(reference)
    }

    pub fn add_nursery(&mut self, name: &str) -> ServiceResult<Reference> {
        self.add_source_of_stock(name, SourceType::Nursery)
    }

    pub fn add_program(&mut self, name: &str) -> ServiceResult<Reference> {
        self.add_source_of_stock(name, SourceType::Program)
    }

    /// Records a new species under its current scientific name.
    pub fn add_species(&mut self, scientific_name: &str) -> ServiceResult<Reference> {
        let species = Species::new(scientific_name)?;
        let reference = self.uow.scope(|uow| {
            uow.species().add(species);
            let committed = uow.commit()?;
            created_reference(&committed.species, AggregateKind::Species)
        })?;
        info!("event=species_add module=service status=ok reference={reference}");
        Ok(reference)
    }

    /// Gives a species a new current name, keeping the old one as history.
    pub fn rename_species(&mut self, reference: &str, new_name: &str) -> ServiceResult<()> {
        self.uow.scope(|uow| {
            let mut species = uow
                .species()
                .get(reference)?
                .ok_or_else(|| ServiceError::SpeciesNotFound(reference.to_string()))?;
            species.rename(new_name)?;
            uow.species().add(species);
            uow.commit()?;
            Ok(())
        })
    }

    /// Opens an empty batch from an existing source of stock.
    pub fn add_batch(
        &mut self,
        source_reference: &str,
        batch_type: BatchType,
    ) -> ServiceResult<Reference> {
        let reference = self.uow.scope(|uow| {
            if uow.sources().get(source_reference)?.is_none() {
                return Err(ServiceError::InvalidSource(source_reference.to_string()));
            }
            uow.batches().add(Batch::new(source_reference, batch_type));
            let committed = uow.commit()?;
            created_reference(&committed.batches, AggregateKind::Batch)
        })?;
        info!("event=batch_add module=service status=ok reference={reference}");
        Ok(reference)
    }

    pub fn add_order(&mut self, source_reference: &str) -> ServiceResult<Reference> {
        self.add_batch(source_reference, BatchType::Order)
    }

    pub fn add_delivery(&mut self, source_reference: &str) -> ServiceResult<Reference> {
        self.add_batch(source_reference, BatchType::Delivery)
    }

    pub fn add_pickup(&mut self, source_reference: &str) -> ServiceResult<Reference> {
        self.add_batch(source_reference, BatchType::Pickup)
    }

    /// Appends one stock line to an existing batch.
    ///
    /// # Errors
    /// - `InvalidQuantity` when `quantity` is zero or above
    ///   `MAX_STOCK_QUANTITY`.
    /// - `BatchNotFound` / `SpeciesNotFound` when either reference is unknown.
    pub fn add_stock(
        &mut self,
        batch_reference: &str,
        species_reference: &str,
        quantity: u32,
        size: StockSize,
    ) -> ServiceResult<()> {
        if quantity == 0 || quantity > MAX_STOCK_QUANTITY {
            return Err(ServiceError::InvalidQuantity);
        }

        self.uow.scope(|uow| {
            let mut batch = uow
                .batches()
                .get(batch_reference)?
                .ok_or_else(|| ServiceError::BatchNotFound(batch_reference.to_string()))?;
            if uow.species().get(species_reference)?.is_none() {
                return Err(ServiceError::SpeciesNotFound(species_reference.to_string()));
            }
            batch.add(Stock::new(species_reference, quantity, size));
            uow.batches().add(batch);
            uow.commit()?;
            Ok(())
        })
    }

    pub fn source_of_stock(&mut self, reference: &str) -> ServiceResult<Option<SourceOfStock>> {
        Ok(self.uow.sources().get(reference)?)
    }

    pub fn species(&mut self, reference: &str) -> ServiceResult<Option<Species>> {
        Ok(self.uow.species().get(reference)?)
    }

    pub fn batch(&mut self, reference: &str) -> ServiceResult<Option<Batch>> {
        Ok(self.uow.batches().get(reference)?)
    }
}

/// Reference of the aggregate a use case just added; it is buffered last.
fn created_reference<A: Aggregate>(written: &[A], kind: AggregateKind) -> ServiceResult<Reference> {
    written
        .last()
        .and_then(|aggregate| aggregate.reference())
        .filter(|reference| !reference.is_empty())
        .map(str::to_string)
        .ok_or(ServiceError::ReferenceNotAssigned(kind))
}
