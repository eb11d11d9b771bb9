use leaftracker_core::db::open_db_in_memory;
use leaftracker_core::repo::{
    batch_repository, source_repository, species_repository, RepoError, BATCH_INDEX,
    SOURCE_OF_STOCK_INDEX, SPECIES_INDEX,
};
use leaftracker_core::{
    create_all_indexes, Aggregate, Batch, BatchType, Document, DocumentStore,
    InMemoryDocumentStore, SourceOfStock, SourceType, Species, SqliteDocumentStore, Stock,
    StockSize, TaxonName,
};
use serde_json::json;

fn juncea() -> Species {
    let mut species = Species::new("Machaerina juncea").unwrap();
    species
        .taxon_history
        .add_previous_name(TaxonName::parse("Baumea juncea").unwrap());
    species
}

#[test]
fn species_round_trips_through_sqlite() {
    let conn = open_db_in_memory().unwrap();
    create_all_indexes(&conn, "").unwrap();
    let store = SqliteDocumentStore::new(&conn, SPECIES_INDEX);
    let mut repository = species_repository(&store);

    repository.add(juncea());
    let written = repository.writer_mut().write().unwrap();
    let reference = written[0].reference().unwrap().to_string();

    let loaded = repository.get(&reference).unwrap().unwrap();
    assert_eq!(loaded, written[0]);
    assert_eq!(loaded.current_name().to_string(), "Machaerina juncea");
    let previous: Vec<_> = loaded.taxon_history.previous().map(|n| n.to_string()).collect();
    assert_eq!(previous, vec!["Baumea juncea"]);
}

#[test]
fn source_round_trips_through_sqlite() {
    let conn = open_db_in_memory().unwrap();
    create_all_indexes(&conn, "").unwrap();
    let store = SqliteDocumentStore::new(&conn, SOURCE_OF_STOCK_INDEX);
    let mut repository = source_repository(&store);

    repository.add(SourceOfStock::new("Trillion Trees", SourceType::Nursery));
    let written = repository.writer_mut().write().unwrap();

    let loaded = repository
        .get(written[0].reference().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(loaded.current_name, "Trillion Trees");
    assert_eq!(loaded.source_type, SourceType::Nursery);
}

#[test]
fn batch_round_trips_through_sqlite_mappings() {
    let conn = open_db_in_memory().unwrap();
    create_all_indexes(&conn, "").unwrap();
    let store = SqliteDocumentStore::new(&conn, BATCH_INDEX);
    let mut repository = batch_repository(&store);

    let mut batch = Batch::new("source-1", BatchType::Pickup);
    batch.add(Stock::new("species-1", 20, StockSize::Tube));
    batch.add(Stock::new("species-1", 4, StockSize::Pot));
    repository.add(batch);
    let written = repository.writer_mut().write().unwrap();

    let loaded = repository
        .get(written[0].reference().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(loaded, written[0]);
    assert_eq!(loaded.quantity("species-1"), 24);
    assert_eq!(loaded.quantity_of_size("species-1", StockSize::Pot), 4);
}

#[test]
fn buffered_aggregates_are_invisible_until_written() {
    let store = InMemoryDocumentStore::new(SPECIES_INDEX);
    let mut repository = species_repository(&store);

    repository.add(juncea());
    assert_eq!(repository.added().count(), 1);
    assert!(repository.get("species-0001").unwrap().is_none());

    repository.writer_mut().write().unwrap();
    assert!(repository.get("species-0001").unwrap().is_some());
    assert_eq!(repository.added().count(), 0);
}

#[test]
fn supplied_reference_overwrites_the_stored_aggregate() {
    let store = InMemoryDocumentStore::new(SOURCE_OF_STOCK_INDEX);
    let mut repository = source_repository(&store);

    repository.add(SourceOfStock::with_reference(
        "Trillion Trees",
        SourceType::Nursery,
        "tt",
    ));
    repository.writer_mut().write().unwrap();
    repository.add(SourceOfStock::with_reference(
        "Trillion Trees Inc",
        SourceType::Program,
        "tt",
    ));
    let written = repository.writer_mut().write().unwrap();

    assert_eq!(written[0].reference(), Some("tt"));
    let loaded = repository.get("tt").unwrap().unwrap();
    assert_eq!(loaded.current_name, "Trillion Trees Inc");
    assert_eq!(store.document_ids(), vec!["tt"]);
}

#[test]
fn unknown_enum_value_is_reported_as_invalid_document() {
    let store = InMemoryDocumentStore::new(BATCH_INDEX);
    store
        .add(
            &Document::from_json(
                Some("odd".to_string()),
                json!({"source_reference": "s", "batch_type": "gift", "stock": []}),
            )
            .unwrap(),
        )
        .unwrap();
    let repository = batch_repository(&store);

    match repository.get("odd") {
        Err(RepoError::InvalidDocument { shape, .. }) => assert_eq!(shape.field, "batch_type"),
        other => panic!("unexpected read outcome: {other:?}"),
    }
}
