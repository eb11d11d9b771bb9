//! Source-of-stock documents: `{current_name, source_type}`.

use super::aggregate_io::AggregateRepository;
use super::convert::{required_enum, required_str, ShapeResult};
use crate::document::{Document, DocumentStore, FieldMapping, Fields, Mappings};
use crate::model::{SourceOfStock, SourceType};
use serde_json::Value;

pub const SOURCE_OF_STOCK_INDEX: &str = "source_of_stock";

pub type SourceOfStockRepository<'s> = AggregateRepository<'s, SourceOfStock>;

pub fn source_mappings() -> Mappings {
    Mappings::dynamic()
        .with_property("current_name", FieldMapping::Text)
        .with_property("source_type", FieldMapping::Keyword)
}

pub fn source_repository(store: &dyn DocumentStore) -> SourceOfStockRepository<'_> {
    AggregateRepository::new(store, source_to_document, document_to_source)
}

pub fn source_to_document(source: &SourceOfStock) -> Document {
    let mut fields = Fields::new();
    fields.insert(
        "current_name".to_string(),
        Value::String(source.current_name.clone()),
    );
    fields.insert(
        "source_type".to_string(),
        Value::String(source_type_to_document(source.source_type).to_string()),
    );
    Document::new(source.reference.clone(), fields)
}

pub fn document_to_source(document: &Document) -> ShapeResult<SourceOfStock> {
    let fields = &document.fields;
    Ok(SourceOfStock {
        reference: document.id.clone(),
        current_name: required_str(fields, "current_name")?.to_string(),
        source_type: required_enum(fields, "source_type", parse_source_type)?,
    })
}

pub(crate) fn source_type_to_document(source_type: SourceType) -> &'static str {
    match source_type {
        SourceType::Nursery => "nursery",
        SourceType::Program => "program",
    }
}

pub fn parse_source_type(value: &str) -> Option<SourceType> {
    match value {
        "nursery" => Some(SourceType::Nursery),
        "program" => Some(SourceType::Program),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{document_to_source, source_to_document};
    use crate::document::Document;
    use crate::model::{SourceOfStock, SourceType};
    use serde_json::json;

    #[test]
    fn converts_both_ways() {
        let source = SourceOfStock::with_reference("Trillion Trees", SourceType::Nursery, "source-0001");
        let document = Document::from_json(
            Some("source-0001".to_string()),
            json!({"current_name": "Trillion Trees", "source_type": "nursery"}),
        )
        .unwrap();

        assert_eq!(source_to_document(&source), document);
        assert_eq!(document_to_source(&document).unwrap(), source);
    }

    #[test]
    fn unreferenced_source_has_no_document_id() {
        let source = SourceOfStock::new("Habitat Links", SourceType::Program);
        let document = source_to_document(&source);
        assert_eq!(document.id, None);
        assert_eq!(document.field("source_type"), Some(&json!("program")));
    }

    #[test]
    fn rejects_unknown_source_type() {
        let document = Document::from_json(
            None,
            json!({"current_name": "Somewhere", "source_type": "market"}),
        )
        .unwrap();
        let error = document_to_source(&document).unwrap_err();
        assert_eq!(error.field, "source_type");
        assert!(error.message.contains("market"));
    }
}
