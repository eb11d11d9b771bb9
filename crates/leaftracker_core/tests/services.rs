use leaftracker_core::db::open_db_in_memory;
use leaftracker_core::repo::{BATCH_INDEX, SOURCE_OF_STOCK_INDEX, SPECIES_INDEX};
use leaftracker_core::{
    create_all_indexes, AggregateKind, BatchType, Document, DocumentStore,
    InMemoryDocumentStore, NurseryService, ServiceError, SourceOfStock, SourceType,
    SqliteDocumentStore, StockSize, StoreResult, UnitOfWork, MAX_STOCK_QUANTITY,
};

struct Stores {
    sources: InMemoryDocumentStore,
    species: InMemoryDocumentStore,
    batches: InMemoryDocumentStore,
}

impl Stores {
    fn new() -> Self {
        Self {
            sources: InMemoryDocumentStore::new(SOURCE_OF_STOCK_INDEX),
            species: InMemoryDocumentStore::new(SPECIES_INDEX),
            batches: InMemoryDocumentStore::new(BATCH_INDEX),
        }
    }

    fn service(&self) -> NurseryService<'_> {
        NurseryService::new(UnitOfWork::from_stores(
            &self.sources,
            &self.species,
            &self.batches,
        ))
    }
}

/// Accepts every write but hands back an empty id.
struct BlankIdStore(InMemoryDocumentStore);

impl DocumentStore for BlankIdStore {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn add(&self, document: &Document) -> StoreResult<String> {
        self.0.add(document)?;
        Ok(String::new())
    }

    fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        self.0.get(id)
    }

    fn exists(&self, id: &str) -> StoreResult<bool> {
        self.0.exists(id)
    }

    fn count(&self) -> StoreResult<u64> {
        self.0.count()
    }

    fn delete_all(&self) -> StoreResult<()> {
        self.0.delete_all()
    }
}

#[test]
fn add_nursery_and_program_record_source_type() {
    let stores = Stores::new();
    let mut service = stores.service();

    let nursery = service.add_nursery("Trillion Trees").unwrap();
    let program = service.add_program("Gift of Trees").unwrap();
    assert_eq!(nursery, "source_of_stock-0001");

    let loaded = service.source_of_stock(&program).unwrap().unwrap();
    assert_eq!(loaded.current_name, "Gift of Trees");
    assert_eq!(loaded.source_type, SourceType::Program);
}

#[test]
fn add_species_normalizes_and_rejects_bad_names() {
    let stores = Stores::new();
    let mut service = stores.service();

    let reference = service.add_species("machaerina JUNCEA").unwrap();
    let species = service.species(&reference).unwrap().unwrap();
    assert_eq!(species.current_name().to_string(), "Machaerina juncea");

    assert!(matches!(
        service.add_species("Machaerina"),
        Err(ServiceError::MalformedName(_))
    ));
    assert_eq!(stores.species.document_ids(), vec![reference]);
}

#[test]
fn rename_species_keeps_history() {
    let stores = Stores::new();
    let mut service = stores.service();

    let reference = service.add_species("Baumea juncea").unwrap();
    service
        .rename_species(&reference, "Machaerina juncea")
        .unwrap();

    let species = service.species(&reference).unwrap().unwrap();
    assert_eq!(species.current_name().to_string(), "Machaerina juncea");
    let previous: Vec<_> = species.taxon_history.previous().map(|n| n.to_string()).collect();
    assert_eq!(previous, vec!["Baumea juncea"]);
    assert_eq!(stores.species.document_ids().len(), 1);
}

#[test]
fn rename_of_unknown_species_fails() {
    let stores = Stores::new();
    let mut service = stores.service();

    match service.rename_species("species-0042", "Machaerina juncea") {
        Err(ServiceError::SpeciesNotFound(reference)) => assert_eq!(reference, "species-0042"),
        other => panic!("unexpected rename outcome: {other:?}"),
    }
}

#[test]
fn batches_require_an_existing_source() {
    let stores = Stores::new();
    let mut service = stores.service();

    assert!(matches!(
        service.add_order("source_of_stock-0001"),
        Err(ServiceError::InvalidSource(_))
    ));
    assert!(stores.batches.document_ids().is_empty());
    assert!(!service.unit_of_work().has_pending());

    let source = service.add_nursery("Trillion Trees").unwrap();
    let delivery = service.add_delivery(&source).unwrap();
    let pickup = service.add_pickup(&source).unwrap();
    assert_eq!(
        service.batch(&delivery).unwrap().unwrap().batch_type,
        BatchType::Delivery
    );
    assert_eq!(
        service.batch(&pickup).unwrap().unwrap().batch_type,
        BatchType::Pickup
    );
}

#[test]
fn add_stock_appends_lines_to_the_batch() {
    let stores = Stores::new();
    let mut service = stores.service();

    let source = service.add_nursery("Trillion Trees").unwrap();
    let species = service.add_species("Machaerina juncea").unwrap();
    let batch = service.add_pickup(&source).unwrap();

    service
        .add_stock(&batch, &species, 20, StockSize::Tube)
        .unwrap();
    service.add_stock(&batch, &species, 3, StockSize::Pot).unwrap();

    let loaded = service.batch(&batch).unwrap().unwrap();
    assert_eq!(loaded.quantity(&species), 23);
    assert_eq!(loaded.quantity_of_size(&species, StockSize::Tube), 20);
    assert_eq!(loaded.species(), vec![species.as_str()]);
}

#[test]
fn add_stock_validates_its_inputs() {
    let stores = Stores::new();
    let mut service = stores.service();

    let source = service.add_nursery("Trillion Trees").unwrap();
    let species = service.add_species("Machaerina juncea").unwrap();
    let batch = service.add_order(&source).unwrap();

    assert!(matches!(
        service.add_stock(&batch, &species, 0, StockSize::Tube),
        Err(ServiceError::InvalidQuantity)
    ));
    assert!(matches!(
        service.add_stock("batch-0099", &species, 1, StockSize::Tube),
        Err(ServiceError::BatchNotFound(_))
    ));
    assert!(matches!(
        service.add_stock(&batch, "species-0099", 1, StockSize::Tube),
        Err(ServiceError::SpeciesNotFound(_))
    ));
    assert!(service.batch(&batch).unwrap().unwrap().stock.is_empty());
}

#[test]
fn blank_reference_from_store_is_reported() {
    let sources = BlankIdStore(InMemoryDocumentStore::new(SOURCE_OF_STOCK_INDEX));
    let species = InMemoryDocumentStore::new(SPECIES_INDEX);
    let batches = InMemoryDocumentStore::new(BATCH_INDEX);
    let mut service = NurseryService::new(UnitOfWork::from_stores(&sources, &species, &batches));

    assert!(matches!(
        service.add_nursery("Trillion Trees"),
        Err(ServiceError::ReferenceNotAssigned(AggregateKind::SourceOfStock))
    ));
}

#[test]
fn use_cases_run_against_sqlite_indexes() {
    let conn = open_db_in_memory().unwrap();
    create_all_indexes(&conn, "test_").unwrap();
    let sources = SqliteDocumentStore::new(&conn, "test_source_of_stock");
    let species = SqliteDocumentStore::new(&conn, "test_species");
    let batches = SqliteDocumentStore::new(&conn, "test_batch");
    let mut service = NurseryService::new(UnitOfWork::from_stores(&sources, &species, &batches));

    let source = service.add_nursery("Trillion Trees").unwrap();
    let juncea = service.add_species("Machaerina juncea").unwrap();
    let batch = service.add_pickup(&source).unwrap();
    service
        .add_stock(&batch, &juncea, 20, StockSize::Tube)
        .unwrap();

    let loaded = service.batch(&batch).unwrap().unwrap();
    assert_eq!(loaded.source_reference, source);
    assert_eq!(loaded.quantity(&juncea), 20);
}

#[test]
fn quantity_outside_the_index_integer_range_is_rejected_up_front() {
    let conn = open_db_in_memory().unwrap();
    create_all_indexes(&conn, "test_").unwrap();
    let sources = SqliteDocumentStore::new(&conn, "test_source_of_stock");
    let species = SqliteDocumentStore::new(&conn, "test_species");
    let batches = SqliteDocumentStore::new(&conn, "test_batch");
    let mut service = NurseryService::new(UnitOfWork::from_stores(&sources, &species, &batches));

    let source = service.add_nursery("Trillion Trees").unwrap();
    let juncea = service.add_species("Machaerina juncea").unwrap();
    let batch = service.add_order(&source).unwrap();

    assert!(matches!(
        service.add_stock(&batch, &juncea, 3_000_000_000, StockSize::Tube),
        Err(ServiceError::InvalidQuantity)
    ));
    assert!(matches!(
        service.add_stock(&batch, &juncea, MAX_STOCK_QUANTITY + 1, StockSize::Tube),
        Err(ServiceError::InvalidQuantity)
    ));

    service
        .add_stock(&batch, &juncea, MAX_STOCK_QUANTITY, StockSize::Pot)
        .unwrap();
    let loaded = service.batch(&batch).unwrap().unwrap();
    assert_eq!(loaded.quantity(&juncea), u64::from(MAX_STOCK_QUANTITY));
}

#[test]
fn returned_reference_belongs_to_the_new_aggregate() {
    let stores = Stores::new();
    let mut service = stores.service();

    service
        .unit_of_work()
        .sources()
        .add(SourceOfStock::new("Buffered Nursery", SourceType::Nursery));
    let reference = service.add_nursery("Trillion Trees").unwrap();

    assert_eq!(reference, "source_of_stock-0002");
    let loaded = service.source_of_stock(&reference).unwrap().unwrap();
    assert_eq!(loaded.current_name, "Trillion Trees");
}
