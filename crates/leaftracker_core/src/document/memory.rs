//! In-memory document store used as a test double and for dry runs.
//!
//! # Invariants
//! - Generated ids are `<index>-0001`, `<index>-0002`, ... in `add` order
//!   and are never reissued, not even after `delete`.
//! - A generated id never collides with a live supplied id; taken
//!   sequence numbers are skipped.
//! - Visibility rules match the SQLite backend: new documents are
//!   searchable only after `refresh`.

use super::{
    Document, DocumentStore, Fields, IndexLifecycle, Mappings, StoreError, StoreResult,
};
use log::debug;
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug)]
struct StoredDocument {
    fields: Fields,
    searchable: bool,
}

#[derive(Debug)]
struct IndexState {
    /// Mappings of the live index; `None` while the index does not exist.
    active_mappings: Option<Mappings>,
    documents: BTreeMap<String, StoredDocument>,
    issued_ids: u32,
}

/// Single-index document store kept entirely in memory.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    name: String,
    declared_mappings: Mappings,
    state: RefCell<IndexState>,
}

impl InMemoryDocumentStore {
    /// Creates a store whose index already exists with dynamic mappings.
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(name.into(), Mappings::dynamic(), true)
    }

    /// Creates a store whose index is absent until `lifecycle().create()`.
    pub fn with_mappings(name: impl Into<String>, mappings: Mappings) -> Self {
        Self::build(name.into(), mappings, false)
    }

    fn build(name: String, mappings: Mappings, exists: bool) -> Self {
        Self {
            name,
            state: RefCell::new(IndexState {
                active_mappings: exists.then(|| mappings.clone()),
                documents: BTreeMap::new(),
                issued_ids: 0,
            }),
            declared_mappings: mappings,
        }
    }

    /// Lifecycle handle for this store's index.
    pub fn lifecycle(&self) -> InMemoryLifecycle<'_> {
        InMemoryLifecycle { store: self }
    }

    /// Ids of every live document, searchable or not, in id order.
    pub fn document_ids(&self) -> Vec<String> {
        self.state.borrow().documents.keys().cloned().collect()
    }

    /// Next sequential id not already taken by a supplied id.
    fn next_id(&self, state: &mut IndexState) -> String {
        loop {
            state.issued_ids += 1;
            let id = format!("{}-{:04}", self.name, state.issued_ids);
            if !state.documents.contains_key(&id) {
                return id;
            }
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn add(&self, document: &Document) -> StoreResult<String> {
        let mut state = self.state.borrow_mut();
        let mappings = state.active_mappings.clone().unwrap_or_default();
        mappings
            .validate(&document.fields)
            .map_err(|violation| StoreError::MappingViolation {
                index: self.name.clone(),
                violation,
            })?;

        if state.active_mappings.is_none() {
            debug!("event=index_auto_create module=memory_store index={}", self.name);
            state.active_mappings = Some(Mappings::dynamic());
        }

        let id = match &document.id {
            Some(id) => id.clone(),
            None => self.next_id(&mut state),
        };

        let searchable = state
            .documents
            .get(&id)
            .is_some_and(|existing| existing.searchable);
        state.documents.insert(
            id.clone(),
            StoredDocument {
                fields: document.fields.clone(),
                searchable,
            },
        );
        Ok(id)
    }

    fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        let state = self.state.borrow();
        Ok(state
            .documents
            .get(id)
            .map(|stored| Document::new(Some(id.to_string()), stored.fields.clone())))
    }

    fn exists(&self, id: &str) -> StoreResult<bool> {
        Ok(self.state.borrow().documents.contains_key(id))
    }

    fn count(&self) -> StoreResult<u64> {
        let state = self.state.borrow();
        if state.active_mappings.is_none() {
            return Err(StoreError::IndexNotFound(self.name.clone()));
        }
        let searchable = state.documents.values().filter(|doc| doc.searchable).count();
        Ok(searchable as u64)
    }

    fn delete_all(&self) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if state.active_mappings.is_none() {
            return Err(StoreError::IndexNotFound(self.name.clone()));
        }
        state.documents.retain(|_, doc| !doc.searchable);
        Ok(())
    }
}

/// Lifecycle view over an `InMemoryDocumentStore`.
#[derive(Debug, Clone, Copy)]
pub struct InMemoryLifecycle<'store> {
    store: &'store InMemoryDocumentStore,
}

impl InMemoryLifecycle<'_> {
    /// Mappings of the live index, `None` when the index is absent.
    pub fn stored_mappings(&self) -> Option<Mappings> {
        self.store.state.borrow().active_mappings.clone()
    }
}

impl IndexLifecycle for InMemoryLifecycle<'_> {
    fn name(&self) -> &str {
        &self.store.name
    }

    fn create(&self) -> StoreResult<()> {
        let mut state = self.store.state.borrow_mut();
        if state.active_mappings.is_none() {
            state.active_mappings = Some(self.store.declared_mappings.clone());
        }
        Ok(())
    }

    fn delete(&self) -> StoreResult<()> {
        let mut state = self.store.state.borrow_mut();
        state.active_mappings = None;
        state.documents.clear();
        Ok(())
    }

    fn exists(&self) -> StoreResult<bool> {
        Ok(self.store.state.borrow().active_mappings.is_some())
    }

    fn refresh(&self) -> StoreResult<()> {
        let mut state = self.store.state.borrow_mut();
        if state.active_mappings.is_none() {
            return Err(StoreError::IndexNotFound(self.store.name.clone()));
        }
        for document in state.documents.values_mut() {
            document.searchable = true;
        }
        Ok(())
    }
}
