//! Nursery domain model persisted as documents.
//!
//! # Responsibility
//! - Define the three aggregates (`Species`, `SourceOfStock`, `Batch`) and
//!   the value objects they carry.
//! - Define the `Aggregate` identity contract shared by the writer.
//!
//! # Invariants
//! - A `reference` is assigned by the store on first successful write and
//!   stays stable afterwards.
//! - Aggregates without a reference are never the same aggregate, even when
//!   their state is identical.

pub mod batch;
pub mod source_of_stock;
pub mod species;
pub mod taxon;

pub use batch::{Batch, BatchType, Stock, StockSize};
pub use source_of_stock::{SourceOfStock, SourceType};
pub use species::Species;
pub use taxon::{MalformedTaxonName, TaxonHistory, TaxonName};

/// Externally visible identifier of a persisted aggregate.
pub type Reference = String;

/// Entity persisted as one document and identified by its reference.
pub trait Aggregate {
    fn reference(&self) -> Option<&str>;

    /// Records the id the store returned for this aggregate.
    fn assign_reference(&mut self, reference: Reference);

    /// Identity comparison: both references must be present and equal.
    fn is_same_aggregate(&self, other: &Self) -> bool {
        matches!(
            (self.reference(), other.reference()),
            (Some(left), Some(right)) if left == right
        )
    }
}

macro_rules! impl_aggregate {
    ($ty:ty) => {
        impl Aggregate for $ty {
            fn reference(&self) -> Option<&str> {
                self.reference.as_deref()
            }

            fn assign_reference(&mut self, reference: Reference) {
                self.reference = Some(reference);
            }
        }
    };
}

impl_aggregate!(Species);
impl_aggregate!(SourceOfStock);
impl_aggregate!(Batch);
