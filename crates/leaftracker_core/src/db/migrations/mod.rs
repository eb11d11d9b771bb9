//! Schema steps for the document index tables.
//!
//! Each step is named after the index feature it introduces. The highest
//! applied step is mirrored to `PRAGMA user_version`, and every pending
//! step runs inside one transaction, so a half-migrated database is never
//! observed.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "document_indexes",
    sql: include_str!("0001_document_indexes.sql"),
}];

/// Highest schema version this build can open.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Names of every known schema step, oldest first.
pub fn step_names() -> impl Iterator<Item = &'static str> {
    SCHEMA_STEPS.iter().map(|step| step.name)
}

/// Brings the index tables on `conn` up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
/// - `Migration` naming the step whose SQL failed; nothing is applied.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let on_disk: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if on_disk > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: on_disk,
            latest_supported: latest,
        });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > on_disk)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in &pending {
        let applied = tx.execute_batch(step.sql).and_then(|()| {
            tx.execute_batch(&format!("PRAGMA user_version = {};", step.version))
        });
        applied.map_err(|source| DbError::Migration {
            version: step.version,
            name: step.name,
            source,
        })?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={on_disk} to_version={latest} steps={}",
        pending.len()
    );
    Ok(())
}
