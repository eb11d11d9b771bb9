use leaftracker_core::db::{open_db, open_db_in_memory};
use leaftracker_core::repo::batch_mappings;
use leaftracker_core::{
    create_all_indexes, index_definitions, list_indexes, refresh_all_indexes, Document,
    DocumentStore, InMemoryDocumentStore, IndexLifecycle, Mappings, SqliteDocumentStore,
    SqliteLifecycle,
};
use serde_json::json;

#[test]
fn create_and_delete_are_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let lifecycle = SqliteLifecycle::new(&conn, "test_species", Mappings::dynamic());

    lifecycle.delete().unwrap();
    assert!(!lifecycle.exists().unwrap());

    lifecycle.create().unwrap();
    lifecycle.create().unwrap();
    assert!(lifecycle.exists().unwrap());

    lifecycle.delete().unwrap();
    lifecycle.delete().unwrap();
    assert!(!lifecycle.exists().unwrap());
}

fn check_create_keeps_documents(store: &dyn DocumentStore, lifecycle: &dyn IndexLifecycle) {
    lifecycle.create().unwrap();
    let document =
        Document::from_json(Some("s1".to_string()), json!({"current_name": "Trillion Trees"}))
            .unwrap();
    store.add(&document).unwrap();
    lifecycle.refresh().unwrap();

    lifecycle.create().unwrap();
    assert!(lifecycle.exists().unwrap());
    assert!(store.exists("s1").unwrap());
    assert_eq!(store.get("s1").unwrap(), Some(document));
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn second_create_keeps_written_documents() {
    let conn = open_db_in_memory().unwrap();
    let sqlite_store = SqliteDocumentStore::new(&conn, "test_source_of_stock");
    let sqlite_lifecycle = SqliteLifecycle::new(&conn, "test_source_of_stock", Mappings::dynamic());
    check_create_keeps_documents(&sqlite_store, &sqlite_lifecycle);

    let memory = InMemoryDocumentStore::with_mappings("test_source_of_stock", Mappings::dynamic());
    check_create_keeps_documents(&memory, &memory.lifecycle());
}

#[test]
fn second_create_keeps_the_original_mappings() {
    let conn = open_db_in_memory().unwrap();
    SqliteLifecycle::new(&conn, "test_batch", batch_mappings())
        .create()
        .unwrap();

    let other = SqliteLifecycle::new(&conn, "test_batch", Mappings::dynamic());
    other.create().unwrap();
    assert_eq!(other.stored_mappings().unwrap(), Some(batch_mappings()));
}

#[test]
fn in_memory_create_uses_declared_mappings() {
    let store = InMemoryDocumentStore::with_mappings("test_batch", batch_mappings());
    let lifecycle = store.lifecycle();
    assert_eq!(lifecycle.stored_mappings(), None);

    lifecycle.create().unwrap();
    assert_eq!(lifecycle.stored_mappings(), Some(batch_mappings()));
}

#[test]
fn delete_removes_documents_with_the_index() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, "test_species");
    let lifecycle = SqliteLifecycle::new(&conn, "test_species", Mappings::dynamic());
    let document = Document::from_json(Some("s1".to_string()), json!({"name": "x"})).unwrap();

    store.add(&document).unwrap();
    lifecycle.delete().unwrap();
    assert!(!store.exists("s1").unwrap());
}

#[test]
fn aggregate_indexes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leaftracker.db");

    let conn = open_db(&path).unwrap();
    let created = create_all_indexes(&conn, "test_").unwrap();
    assert_eq!(
        created,
        vec!["test_source_of_stock", "test_species", "test_batch"]
    );
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(
        list_indexes(&conn).unwrap(),
        vec!["test_batch", "test_source_of_stock", "test_species"]
    );
    for definition in index_definitions("test_") {
        let lifecycle = SqliteLifecycle::new(&conn, definition.name.as_str(), Mappings::dynamic());
        assert_eq!(lifecycle.stored_mappings().unwrap(), Some(definition.mappings));
    }
}

#[test]
fn refresh_all_requires_every_index() {
    let conn = open_db_in_memory().unwrap();
    assert!(refresh_all_indexes(&conn, "test_").is_err());

    create_all_indexes(&conn, "test_").unwrap();
    let store = SqliteDocumentStore::new(&conn, "test_species");
    store
        .add(&Document::from_json(None, json!({"taxon_history": []})).unwrap())
        .unwrap();
    refresh_all_indexes(&conn, "test_").unwrap();
    assert_eq!(store.count().unwrap(), 1);
}
