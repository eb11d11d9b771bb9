//! Catalog of the indexes backing each aggregate type.

use crate::document::{IndexLifecycle, Mappings, SqliteLifecycle, StoreResult};
use crate::repo::{
    batch_mappings, source_mappings, species_mappings, BATCH_INDEX, SOURCE_OF_STOCK_INDEX,
    SPECIES_INDEX,
};
use rusqlite::Connection;

/// Name and declared mappings of one aggregate index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: String,
    pub mappings: Mappings,
}

/// The source, species and batch indexes, names prefixed with `prefix`.
pub fn index_definitions(prefix: &str) -> [IndexDefinition; 3] {
    [
        IndexDefinition {
            name: format!("{prefix}{SOURCE_OF_STOCK_INDEX}"),
            mappings: source_mappings(),
        },
        IndexDefinition {
            name: format!("{prefix}{SPECIES_INDEX}"),
            mappings: species_mappings(),
        },
        IndexDefinition {
            name: format!("{prefix}{BATCH_INDEX}"),
            mappings: batch_mappings(),
        },
    ]
}

/// Idempotently creates every aggregate index; returns their names.
pub fn create_all_indexes(conn: &Connection, prefix: &str) -> StoreResult<Vec<String>> {
    let mut created = Vec::new();
    for definition in index_definitions(prefix) {
        SqliteLifecycle::new(conn, definition.name.as_str(), definition.mappings).create()?;
        created.push(definition.name);
    }
    Ok(created)
}

/// Refreshes every aggregate index so counts reflect all writes.
pub fn refresh_all_indexes(conn: &Connection, prefix: &str) -> StoreResult<()> {
    for definition in index_definitions(prefix) {
        SqliteLifecycle::new(conn, definition.name, definition.mappings).refresh()?;
    }
    Ok(())
}
