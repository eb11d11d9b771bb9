//! Generic deferred writer and read-through reader for aggregates.
//!
//! # Invariants
//! - The writer buffer is owned by exactly one writer and keeps add order.
//! - `write` assigns references in buffer order, so with a sequential-id
//!   store the first added aggregate receives the first id.
//! - A failed `write` keeps the failing aggregate and everything after it
//!   buffered; aggregates written before the failure are returned with the
//!   error and are already persisted.

use super::convert::DocumentShapeError;
use crate::document::{Document, DocumentStore, StoreError};
use crate::model::Aggregate;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Converts an aggregate into its document; must be pure.
pub type ToDocument<A> = fn(&A) -> Document;

/// Converts a stored document back into its aggregate; must be pure.
pub type ToAggregate<A> = fn(&Document) -> Result<A, DocumentShapeError>;

/// Repository read/write failure.
#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    /// Stored document cannot be converted into its aggregate.
    InvalidDocument {
        index: String,
        reference: String,
        shape: DocumentShapeError,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidDocument {
                index,
                reference,
                shape,
            } => write!(f, "invalid document `{reference}` in index `{index}`: {shape}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::InvalidDocument { shape, .. } => Some(shape),
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// `write` stopped at a store failure after persisting `written`.
#[derive(Debug)]
pub struct PartialWrite<A> {
    pub index: String,
    /// Aggregates persisted before the failure, references assigned.
    pub written: Vec<A>,
    pub error: StoreError,
}

impl<A> Display for PartialWrite<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "write to index `{}` failed after {} aggregate(s) were saved: {}",
            self.index,
            self.written.len(),
            self.error
        )
    }
}

impl<A: Debug> Error for PartialWrite<A> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

/// Buffers aggregates and writes them through a document store on demand.
pub struct AggregateWriter<'s, A> {
    store: &'s dyn DocumentStore,
    to_document: ToDocument<A>,
    added: Vec<A>,
}

impl<'s, A: Aggregate> AggregateWriter<'s, A> {
    pub fn new(store: &'s dyn DocumentStore, to_document: ToDocument<A>) -> Self {
        Self {
            store,
            to_document,
            added: Vec::new(),
        }
    }

    /// Buffers `aggregate` for the next `write`. No I/O.
    pub fn add(&mut self, aggregate: A) {
        self.added.push(aggregate);
    }

    /// Currently buffered aggregates in add order. Does not consume them.
    pub fn added(&self) -> std::slice::Iter<'_, A> {
        self.added.iter()
    }

    pub fn pending(&self) -> usize {
        self.added.len()
    }

    /// Drops every buffered aggregate without touching the store.
    ///
    /// Returns how many aggregates were discarded.
    pub fn discard(&mut self) -> usize {
        let discarded = self.added.len();
        self.added.clear();
        discarded
    }

    /// Converts and stores every buffered aggregate in add order.
    ///
    /// Returns the written aggregates with their store-assigned references
    /// and leaves the buffer empty. An empty buffer is a no-op.
    ///
    /// # Errors
    /// On the first store failure returns `PartialWrite` holding the
    /// aggregates already persisted; the failing aggregate and the rest stay
    /// buffered.
    pub fn write(&mut self) -> Result<Vec<A>, PartialWrite<A>> {
        let mut remaining = std::mem::take(&mut self.added).into_iter();
        let mut written = Vec::with_capacity(remaining.len());

        while let Some(mut aggregate) = remaining.next() {
            let document = (self.to_document)(&aggregate);
            match self.store.add(&document) {
                Ok(reference) => {
                    aggregate.assign_reference(reference);
                    written.push(aggregate);
                }
                Err(error) => {
                    self.added.push(aggregate);
                    self.added.extend(remaining);
                    warn!(
                        "event=aggregate_write module=repo status=error index={} written={} still_buffered={} error={}",
                        self.store.name(),
                        written.len(),
                        self.added.len(),
                        error
                    );
                    return Err(PartialWrite {
                        index: self.store.name().to_string(),
                        written,
                        error,
                    });
                }
            }
        }

        if !written.is_empty() {
            debug!(
                "event=aggregate_write module=repo status=ok index={} written={}",
                self.store.name(),
                written.len()
            );
        }
        Ok(written)
    }
}

/// Fetches documents by reference and converts them into aggregates.
pub struct AggregateReader<'s, A> {
    store: &'s dyn DocumentStore,
    to_aggregate: ToAggregate<A>,
}

impl<'s, A> AggregateReader<'s, A> {
    pub fn new(store: &'s dyn DocumentStore, to_aggregate: ToAggregate<A>) -> Self {
        Self {
            store,
            to_aggregate,
        }
    }

    /// Returns `Ok(None)` when no document has this reference.
    pub fn read(&self, reference: &str) -> RepoResult<Option<A>> {
        let Some(document) = self.store.get(reference)? else {
            return Ok(None);
        };
        (self.to_aggregate)(&document)
            .map(Some)
            .map_err(|shape| RepoError::InvalidDocument {
                index: self.store.name().to_string(),
                reference: reference.to_string(),
                shape,
            })
    }
}

/// One writer plus one reader over the same index.
pub struct AggregateRepository<'s, A> {
    writer: AggregateWriter<'s, A>,
    reader: AggregateReader<'s, A>,
}

impl<'s, A: Aggregate> AggregateRepository<'s, A> {
    pub fn new(
        store: &'s dyn DocumentStore,
        to_document: ToDocument<A>,
        to_aggregate: ToAggregate<A>,
    ) -> Self {
        Self {
            writer: AggregateWriter::new(store, to_document),
            reader: AggregateReader::new(store, to_aggregate),
        }
    }

    /// Buffers `aggregate`; it becomes readable only after a write.
    pub fn add(&mut self, aggregate: A) {
        self.writer.add(aggregate);
    }

    /// Reads through to the store, ignoring buffered aggregates.
    pub fn get(&self, reference: &str) -> RepoResult<Option<A>> {
        self.reader.read(reference)
    }

    pub fn added(&self) -> std::slice::Iter<'_, A> {
        self.writer.added()
    }

    pub fn writer(&self) -> &AggregateWriter<'s, A> {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut AggregateWriter<'s, A> {
        &mut self.writer
    }

    pub fn reader(&self) -> &AggregateReader<'s, A> {
        &self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::{AggregateRepository, AggregateWriter, RepoError};
    use crate::document::{Document, DocumentStore, InMemoryDocumentStore};
    use crate::model::{Aggregate, SourceOfStock, SourceType};
    use crate::repo::{document_to_source, source_to_document};
    use serde_json::json;

    fn nursery(name: &str) -> SourceOfStock {
        SourceOfStock::new(name, SourceType::Nursery)
    }

    #[test]
    fn added_is_a_restartable_snapshot() {
        let store = InMemoryDocumentStore::new("source_of_stock");
        let mut writer = AggregateWriter::new(&store, source_to_document);
        writer.add(nursery("Trillion Trees"));
        writer.add(nursery("Natural Area"));

        let first: Vec<_> = writer.added().map(|s| s.current_name.clone()).collect();
        let second: Vec<_> = writer.added().map(|s| s.current_name.clone()).collect();
        assert_eq!(first, vec!["Trillion Trees", "Natural Area"]);
        assert_eq!(first, second);
        assert_eq!(writer.pending(), 2);
    }

    #[test]
    fn write_assigns_references_in_add_order_and_clears_buffer() {
        let store = InMemoryDocumentStore::new("source_of_stock");
        let mut writer = AggregateWriter::new(&store, source_to_document);
        writer.add(nursery("Trillion Trees"));
        writer.add(nursery("Natural Area"));

        let written = writer.write().unwrap();
        let references: Vec<_> = written.iter().map(|s| s.reference().unwrap()).collect();
        assert_eq!(references, vec!["source_of_stock-0001", "source_of_stock-0002"]);
        assert_eq!(writer.pending(), 0);
    }

    #[test]
    fn write_with_empty_buffer_touches_nothing() {
        let store = InMemoryDocumentStore::new("source_of_stock");
        let mut writer = AggregateWriter::<SourceOfStock>::new(&store, source_to_document);
        assert!(writer.write().unwrap().is_empty());
        assert!(store.document_ids().is_empty());
    }

    #[test]
    fn discard_never_reaches_the_store() {
        let store = InMemoryDocumentStore::new("source_of_stock");
        let mut writer = AggregateWriter::new(&store, source_to_document);
        writer.add(nursery("Trillion Trees"));
        assert_eq!(writer.discard(), 1);
        assert_eq!(writer.added().count(), 0);
        assert!(store.document_ids().is_empty());
    }

    #[test]
    fn get_does_not_see_buffered_aggregates() {
        let store = InMemoryDocumentStore::new("source_of_stock");
        let mut repository = AggregateRepository::new(&store, source_to_document, document_to_source);
        repository.add(nursery("Trillion Trees"));
        assert!(repository.get("source_of_stock-0001").unwrap().is_none());

        repository.writer_mut().write().unwrap();
        let stored = repository.get("source_of_stock-0001").unwrap().unwrap();
        assert_eq!(stored.current_name, "Trillion Trees");
    }

    #[test]
    fn read_reports_undecodable_documents() {
        let store = InMemoryDocumentStore::new("source_of_stock");
        store
            .add(&Document::from_json(Some("broken".to_string()), json!({"current_name": 7})).unwrap())
            .unwrap();
        let repository = AggregateRepository::new(&store, source_to_document, document_to_source);

        match repository.get("broken") {
            Err(RepoError::InvalidDocument { reference, shape, .. }) => {
                assert_eq!(reference, "broken");
                assert_eq!(shape.field, "current_name");
            }
            other => panic!("unexpected read outcome: {other:?}"),
        }
    }
}
