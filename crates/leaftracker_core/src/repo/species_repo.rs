//! Species documents: `{current_scientific_name, previous_scientific_names}`.

use super::aggregate_io::AggregateRepository;
use super::convert::{required_str, string_array, DocumentShapeError, ShapeResult};
use crate::document::{Document, DocumentStore, FieldMapping, Fields, Mappings};
use crate::model::{Species, TaxonHistory, TaxonName};
use serde_json::Value;

pub const SPECIES_INDEX: &str = "species";

pub type SpeciesRepository<'s> = AggregateRepository<'s, Species>;

pub fn species_mappings() -> Mappings {
    Mappings::dynamic()
        .with_property("current_scientific_name", FieldMapping::Text)
        .with_property("previous_scientific_names", FieldMapping::Text)
}

pub fn species_repository(store: &dyn DocumentStore) -> SpeciesRepository<'_> {
    AggregateRepository::new(store, species_to_document, document_to_species)
}

pub fn species_to_document(species: &Species) -> Document {
    let history = &species.taxon_history;
    let previous: Vec<Value> = history
        .previous()
        .map(|name| Value::String(name.to_string()))
        .collect();

    let mut fields = Fields::new();
    fields.insert(
        "current_scientific_name".to_string(),
        Value::String(history.current().to_string()),
    );
    fields.insert("previous_scientific_names".to_string(), Value::Array(previous));
    Document::new(species.reference.clone(), fields)
}

pub fn document_to_species(document: &Document) -> ShapeResult<Species> {
    let fields = &document.fields;
    let current = parse_name(
        "current_scientific_name",
        required_str(fields, "current_scientific_name")?,
    )?;

    let mut taxon_history = TaxonHistory::new(current);
    for (position, name) in string_array(fields, "previous_scientific_names")?
        .into_iter()
        .enumerate()
    {
        let field = format!("previous_scientific_names[{position}]");
        taxon_history.add_previous_name(parse_name(&field, name)?);
    }

    Ok(Species {
        reference: document.id.clone(),
        taxon_history,
    })
}

fn parse_name(field: &str, value: &str) -> ShapeResult<TaxonName> {
    TaxonName::parse(value).map_err(|err| DocumentShapeError::new(field, err.to_string()))
}
