//! Document wire shape and the store/lifecycle contracts.
//!
//! # Responsibility
//! - Define `Document`, the only shape exchanged with a document store.
//! - Define the `DocumentStore` and `IndexLifecycle` seams that every
//!   backend (SQLite, in-memory) implements.
//!
//! # Invariants
//! - `add`, `get` and `exists` are immediately consistent for one document.
//! - `count` and `delete_all` only observe documents made searchable by
//!   `IndexLifecycle::refresh`.
//! - Absent documents are `None`/`false`, never an error.
//! - `create` on an existing index and `delete` on a missing index are
//!   no-ops.

use crate::db::DbError;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod mapping;
pub mod memory;
pub mod sqlite;

pub use mapping::{FieldMapping, MappingViolation, Mappings};
pub use memory::{InMemoryDocumentStore, InMemoryLifecycle};
pub use sqlite::{list_indexes, SqliteDocumentStore, SqliteLifecycle};

/// Structured document payload: nested maps, lists and scalars only.
pub type Fields = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Serialized form of one aggregate.
///
/// Two documents are equal when both `id` and `fields` are deeply equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Store identifier. `None` asks the store to generate one on `add`.
    pub id: Option<String>,
    /// Store-agnostic payload.
    pub fields: Fields,
}

impl Document {
    pub fn new(id: Option<String>, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Builds a document from a JSON object literal.
    ///
    /// Returns `None` when `value` is not an object.
    pub fn from_json(id: Option<String>, value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { id, fields }),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Errors raised by document stores and index lifecycles.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap failure.
    Db(DbError),
    /// Operation requires an index that does not exist.
    IndexNotFound(String),
    /// Declared mappings could not be parsed.
    InvalidMappings { index: String, message: String },
    /// Document field does not fit the index mappings; nothing was written.
    MappingViolation {
        index: String,
        violation: MappingViolation,
    },
    /// Persisted document or mappings cannot be decoded.
    InvalidData { index: String, message: String },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::IndexNotFound(index) => write!(f, "index not found: {index}"),
            Self::InvalidMappings { index, message } => {
                write!(f, "invalid mappings for index `{index}`: {message}")
            }
            Self::MappingViolation { index, violation } => {
                write!(f, "document rejected by index `{index}`: {violation}")
            }
            Self::InvalidData { index, message } => {
                write!(f, "invalid stored data in index `{index}`: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MappingViolation { violation, .. } => Some(violation),
            Self::IndexNotFound(_) | Self::InvalidMappings { .. } | Self::InvalidData { .. } => {
                None
            }
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Keyed document access against one named index.
pub trait DocumentStore {
    /// Name of the index this store is scoped to.
    fn name(&self) -> &str;

    /// Upserts `document` and returns its id.
    ///
    /// When `document.id` is `None` the store generates an id unique within
    /// the index.
    fn add(&self, document: &Document) -> StoreResult<String>;

    /// Fetches one document; `Ok(None)` when absent.
    fn get(&self, id: &str) -> StoreResult<Option<Document>>;

    fn exists(&self, id: &str) -> StoreResult<bool>;

    /// Number of searchable documents. Lags writes until a refresh.
    fn count(&self) -> StoreResult<u64>;

    /// Removes every searchable document. Unrefreshed writes survive.
    fn delete_all(&self) -> StoreResult<()>;
}

/// Idempotent management of the index behind a `DocumentStore`.
pub trait IndexLifecycle {
    fn name(&self) -> &str;

    /// Creates the index with its declared mappings unless it exists.
    fn create(&self) -> StoreResult<()>;

    /// Drops the index and its documents; missing indexes are ignored.
    fn delete(&self) -> StoreResult<()>;

    fn exists(&self) -> StoreResult<bool>;

    /// Makes every pending write visible to `count` and `delete_all`.
    fn refresh(&self) -> StoreResult<()>;
}
