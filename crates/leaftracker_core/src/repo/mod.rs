//! Aggregate persistence over document stores.
//!
//! # Responsibility
//! - Provide the generic deferred-write `AggregateWriter` and read-through
//!   `AggregateReader`.
//! - Wire one writer/reader pair per aggregate type with its document
//!   conversion functions and index mappings.
//!
//! # Invariants
//! - `add` never performs I/O; only `AggregateWriter::write` reaches the
//!   store.
//! - `get` always reads through to the store and never sees the buffer.
//! - Store errors are surfaced unchanged; absent documents are `None`.

pub mod aggregate_io;
pub mod batch_repo;
pub mod convert;
pub mod source_repo;
pub mod species_repo;

pub use aggregate_io::{
    AggregateReader, AggregateRepository, AggregateWriter, PartialWrite, RepoError, RepoResult,
    ToAggregate, ToDocument,
};
pub use batch_repo::{
    batch_mappings, batch_repository, batch_to_document, document_to_batch, parse_batch_type,
    parse_stock_size, BatchRepository, BATCH_INDEX,
};
pub use convert::DocumentShapeError;
pub use source_repo::{
    document_to_source, parse_source_type, source_mappings, source_repository, source_to_document,
    SourceOfStockRepository, SOURCE_OF_STOCK_INDEX,
};
pub use species_repo::{
    document_to_species, species_mappings, species_repository, species_to_document,
    SpeciesRepository, SPECIES_INDEX,
};
