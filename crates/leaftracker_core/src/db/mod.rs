//! SQLite file that stands in for the search engine.
//!
//! Every named index is a row in `document_indexes`; its documents live in
//! `documents` with an `is_searchable` flag flipped by refresh.
//!
//! # Invariants
//! - A connection handed out here has the index tables at
//!   `migrations::latest_version()`.
//! - Files written by a newer build are refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure opening or migrating the database that holds document indexes.
#[derive(Debug)]
pub enum DbError {
    /// Statement failure while reading or writing index rows.
    Sqlite(rusqlite::Error),
    /// The file carries index tables from a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A schema step for the index tables failed and was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "document index storage error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "document index tables are at schema version {db_version}, this build reads up to {latest_supported}"
            ),
            Self::Migration {
                version,
                name,
                source,
            } => write!(
                f,
                "schema step {version} (`{name}`) for the document index tables failed: {source}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
