//! Persistence core for tracking nursery stock.
//!
//! Aggregates (species, sources of stock, batches) are converted to
//! documents and stored in named indexes. Writes are buffered per aggregate
//! kind and flushed together by a unit of work.

pub mod config;
pub mod db;
pub mod document;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod uow;

pub use config::{Config, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use document::{
    list_indexes, Document, DocumentStore, FieldMapping, Fields, InMemoryDocumentStore,
    IndexLifecycle, MappingViolation, Mappings, SqliteDocumentStore, SqliteLifecycle,
    StoreError, StoreResult,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{
    Aggregate, Batch, BatchType, MalformedTaxonName, Reference, SourceOfStock, SourceType,
    Species, Stock, StockSize, TaxonHistory, TaxonName,
};
pub use repo::{PartialWrite, RepoError, RepoResult};
pub use service::{NurseryService, ServiceError, ServiceResult, MAX_STOCK_QUANTITY};
pub use uow::{
    create_all_indexes, index_definitions, refresh_all_indexes, AggregateKind, CommitError,
    Committed, IndexDefinition, UnitOfWork,
};
