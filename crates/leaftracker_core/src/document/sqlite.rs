//! SQLite-backed document indexes with near-real-time visibility.
//!
//! # Responsibility
//! - Implement `DocumentStore` and `IndexLifecycle` over the migrated
//!   `document_indexes`/`documents` tables.
//! - Emulate search-engine refresh semantics with `documents.is_searchable`.
//!
//! # Invariants
//! - `get`/`exists` read every live row regardless of refresh state.
//! - `count`/`delete_all` only touch rows with `is_searchable = 1`.
//! - Writing to a missing index creates it with dynamic mappings.

use super::{Document, DocumentStore, Fields, IndexLifecycle, Mappings, StoreError, StoreResult};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use uuid::Uuid;

/// Document store scoped to one named index.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
    name: String,
}

impl<'conn> SqliteDocumentStore<'conn> {
    pub fn new(conn: &'conn Connection, name: impl Into<String>) -> Self {
        Self {
            conn,
            name: name.into(),
        }
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn add(&self, document: &Document) -> StoreResult<String> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let mappings = match load_mappings(&tx, &self.name)? {
            Some(mappings) => mappings,
            None => {
                insert_index(&tx, &self.name, &Mappings::dynamic())?;
                info!(
                    "event=index_auto_create module=sqlite_store status=ok index={}",
                    self.name
                );
                Mappings::dynamic()
            }
        };
        mappings
            .validate(&document.fields)
            .map_err(|violation| StoreError::MappingViolation {
                index: self.name.clone(),
                violation,
            })?;

        let id = document
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let source = serde_json::to_string(&document.fields).map_err(|err| {
            StoreError::InvalidData {
                index: self.name.clone(),
                message: format!("document `{id}` cannot be encoded: {err}"),
            }
        })?;

        tx.execute(
            "INSERT INTO documents (index_name, doc_id, source)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (index_name, doc_id) DO UPDATE
             SET
                source = excluded.source,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![self.name, id, source],
        )?;
        tx.commit()?;

        debug!(
            "event=document_add module=sqlite_store status=ok index={} generated_id={}",
            self.name,
            document.id.is_none()
        );
        Ok(id)
    }

    fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        let source: Option<String> = self
            .conn
            .query_row(
                "SELECT source FROM documents WHERE index_name = ?1 AND doc_id = ?2;",
                params![self.name, id],
                |row| row.get(0),
            )
            .optional()?;

        match source {
            Some(source) => {
                let fields = decode_fields(&self.name, id, &source)?;
                Ok(Some(Document::new(Some(id.to_string()), fields)))
            }
            None => Ok(None),
        }
    }

    fn exists(&self, id: &str) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM documents WHERE index_name = ?1 AND doc_id = ?2
            );",
            params![self.name, id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn count(&self) -> StoreResult<u64> {
        ensure_index_exists(self.conn, &self.name)?;
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE index_name = ?1 AND is_searchable = 1;",
            [self.name.as_str()],
            |row| row.get(0),
        )?;
        u64::try_from(count).map_err(|_| StoreError::InvalidData {
            index: self.name.clone(),
            message: format!("negative document count {count}"),
        })
    }

    fn delete_all(&self) -> StoreResult<()> {
        ensure_index_exists(self.conn, &self.name)?;
        let deleted = self.conn.execute(
            "DELETE FROM documents WHERE index_name = ?1 AND is_searchable = 1;",
            [self.name.as_str()],
        )?;
        info!(
            "event=documents_delete_all module=sqlite_store status=ok index={} deleted={deleted}",
            self.name
        );
        Ok(())
    }
}

/// Lifecycle of one named index and its declared mappings.
pub struct SqliteLifecycle<'conn> {
    conn: &'conn Connection,
    name: String,
    mappings: Mappings,
}

impl<'conn> SqliteLifecycle<'conn> {
    pub fn new(conn: &'conn Connection, name: impl Into<String>, mappings: Mappings) -> Self {
        Self {
            conn,
            name: name.into(),
            mappings,
        }
    }

    /// Mappings persisted for the live index, `None` when it is absent.
    pub fn stored_mappings(&self) -> StoreResult<Option<Mappings>> {
        load_mappings(self.conn, &self.name)
    }
}

impl IndexLifecycle for SqliteLifecycle<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self) -> StoreResult<()> {
        if insert_index(self.conn, &self.name, &self.mappings)? {
            info!("event=index_create module=sqlite_lifecycle status=ok index={}", self.name);
        } else {
            debug!(
                "event=index_create module=sqlite_lifecycle status=skipped reason=exists index={}",
                self.name
            );
        }
        Ok(())
    }

    fn delete(&self) -> StoreResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM document_indexes WHERE name = ?1;", [self.name.as_str()])?;
        info!(
            "event=index_delete module=sqlite_lifecycle status=ok index={} existed={}",
            self.name,
            deleted > 0
        );
        Ok(())
    }

    fn exists(&self) -> StoreResult<bool> {
        index_exists(self.conn, &self.name)
    }

    fn refresh(&self) -> StoreResult<()> {
        ensure_index_exists(self.conn, &self.name)?;
        let refreshed = self.conn.execute(
            "UPDATE documents SET is_searchable = 1 WHERE index_name = ?1 AND is_searchable = 0;",
            [self.name.as_str()],
        )?;
        debug!(
            "event=index_refresh module=sqlite_lifecycle status=ok index={} refreshed={refreshed}",
            self.name
        );
        Ok(())
    }
}

/// Lists every index name in the database, sorted ascending.
pub fn list_indexes(conn: &Connection) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM document_indexes ORDER BY name ASC;")?;
    let mut rows = stmt.query([])?;
    let mut names = Vec::new();
    while let Some(row) = rows.next()? {
        names.push(row.get(0)?);
    }
    Ok(names)
}

/// Inserts the index row; returns `false` when the index already existed.
fn insert_index(conn: &Connection, name: &str, mappings: &Mappings) -> StoreResult<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO document_indexes (name, mappings) VALUES (?1, ?2);",
        params![name, mappings.to_json().to_string()],
    )?;
    Ok(inserted == 1)
}

fn load_mappings(conn: &Connection, name: &str) -> StoreResult<Option<Mappings>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT mappings FROM document_indexes WHERE name = ?1;",
            [name],
            |row| row.get(0),
        )
        .optional()?;

    let Some(raw) = raw else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).map_err(|err| StoreError::InvalidData {
        index: name.to_string(),
        message: format!("stored mappings are not JSON: {err}"),
    })?;
    Mappings::from_json(&value)
        .map(Some)
        .map_err(|message| StoreError::InvalidMappings {
            index: name.to_string(),
            message,
        })
}

fn index_exists(conn: &Connection, name: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM document_indexes WHERE name = ?1);",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn ensure_index_exists(conn: &Connection, name: &str) -> StoreResult<()> {
    if index_exists(conn, name)? {
        Ok(())
    } else {
        Err(StoreError::IndexNotFound(name.to_string()))
    }
}

fn decode_fields(index: &str, id: &str, source: &str) -> StoreResult<Fields> {
    serde_json::from_str(source).map_err(|err| StoreError::InvalidData {
        index: index.to_string(),
        message: format!("document `{id}` is not a JSON object: {err}"),
    })
}
