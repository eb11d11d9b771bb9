//! Batch documents: `{source_reference, batch_type, stock: [..]}`.

use super::aggregate_io::AggregateRepository;
use super::convert::{
    required_array, required_enum, required_str, required_u32, DocumentShapeError, ShapeResult,
};
use crate::document::{Document, DocumentStore, FieldMapping, Fields, Mappings};
use crate::model::{Batch, BatchType, Stock, StockSize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const BATCH_INDEX: &str = "batch";

pub type BatchRepository<'s> = AggregateRepository<'s, Batch>;

pub fn batch_mappings() -> Mappings {
    let stock = BTreeMap::from([
        ("species_reference".to_string(), FieldMapping::Keyword),
        ("quantity".to_string(), FieldMapping::Integer),
        ("size".to_string(), FieldMapping::Keyword),
    ]);
    Mappings::dynamic()
        .with_property("source_reference", FieldMapping::Keyword)
        .with_property("batch_type", FieldMapping::Keyword)
        .with_property("stock", FieldMapping::Object(stock))
}

pub fn batch_repository(store: &dyn DocumentStore) -> BatchRepository<'_> {
    AggregateRepository::new(store, batch_to_document, document_to_batch)
}

pub fn batch_to_document(batch: &Batch) -> Document {
    let stock: Vec<Value> = batch.stock.iter().map(stock_to_value).collect();

    let mut fields = Fields::new();
    fields.insert(
        "source_reference".to_string(),
        Value::String(batch.source_reference.clone()),
    );
    fields.insert(
        "batch_type".to_string(),
        Value::String(batch_type_to_document(batch.batch_type).to_string()),
    );
    fields.insert("stock".to_string(), Value::Array(stock));
    Document::new(batch.reference.clone(), fields)
}

pub fn document_to_batch(document: &Document) -> ShapeResult<Batch> {
    let fields = &document.fields;
    let mut batch = Batch {
        reference: document.id.clone(),
        source_reference: required_str(fields, "source_reference")?.to_string(),
        batch_type: required_enum(fields, "batch_type", parse_batch_type)?,
        stock: Vec::new(),
    };

    for (position, line) in required_array(fields, "stock")?.iter().enumerate() {
        let Some(line) = line.as_object() else {
            return Err(DocumentShapeError::new(
                format!("stock[{position}]"),
                "must be an object",
            ));
        };
        batch.add(value_to_stock(line).map_err(|err| err.within("stock", position))?);
    }

    Ok(batch)
}

fn stock_to_value(stock: &Stock) -> Value {
    let mut line = Fields::new();
    line.insert(
        "species_reference".to_string(),
        Value::String(stock.species_reference.clone()),
    );
    line.insert("quantity".to_string(), Value::from(stock.quantity));
    line.insert(
        "size".to_string(),
        Value::String(stock_size_to_document(stock.size).to_string()),
    );
    Value::Object(line)
}

fn value_to_stock(line: &Fields) -> ShapeResult<Stock> {
    Ok(Stock {
        species_reference: required_str(line, "species_reference")?.to_string(),
        quantity: required_u32(line, "quantity")?,
        size: required_enum(line, "size", parse_stock_size)?,
    })
}

pub(crate) fn batch_type_to_document(batch_type: BatchType) -> &'static str {
    match batch_type {
        BatchType::Order => "order",
        BatchType::Delivery => "delivery",
        BatchType::Pickup => "pickup",
    }
}

pub fn parse_batch_type(value: &str) -> Option<BatchType> {
    match value {
        "order" => Some(BatchType::Order),
        "delivery" => Some(BatchType::Delivery),
        "pickup" => Some(BatchType::Pickup),
        _ => None,
    }
}

pub(crate) fn stock_size_to_document(size: StockSize) -> &'static str {
    match size {
        StockSize::Tube => "tube",
        StockSize::Pot => "pot",
    }
}

pub fn parse_stock_size(value: &str) -> Option<StockSize> {
    match value {
        "tube" => Some(StockSize::Tube),
        "pot" => Some(StockSize::Pot),
        _ => None,
    }
}
