//! Field mappings declared when an index is created.
//!
//! Mappings use the search-engine shape
//! `{"properties": {"field": {"type": "keyword"}}}`. Nested objects declare
//! their own `properties`. Fields that are not declared are accepted as-is.

use super::Fields;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Declared type of one mapped field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMapping {
    /// Analyzed string.
    Text,
    /// Exact-match string (references, enum values).
    Keyword,
    /// 32-bit signed integer.
    Integer,
    /// Object, or array of objects, with its own mapped properties.
    Object(BTreeMap<String, FieldMapping>),
}

/// Mapped properties of one index. Empty mappings are fully dynamic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mappings {
    properties: BTreeMap<String, FieldMapping>,
}

/// A document field that does not fit its declared mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingViolation {
    /// Dotted path of the offending field, e.g. `stock.quantity`.
    pub field: String,
    pub message: String,
}

impl Display for MappingViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "field `{}` {}", self.field, self.message)
    }
}

impl Error for MappingViolation {}

impl Mappings {
    /// Mappings with no declared fields.
    pub fn dynamic() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, field: impl Into<String>, mapping: FieldMapping) -> Self {
        self.properties.insert(field.into(), mapping);
        self
    }

    pub fn property(&self, field: &str) -> Option<&FieldMapping> {
        self.properties.get(field)
    }

    pub fn is_dynamic(&self) -> bool {
        self.properties.is_empty()
    }

    /// Parses the `{"properties": {...}}` JSON form.
    ///
    /// An empty object yields dynamic mappings.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "mappings must be a JSON object".to_string())?;
        match object.get("properties") {
            None => Ok(Self::dynamic()),
            Some(properties) => Ok(Self {
                properties: parse_properties(properties, "")?,
            }),
        }
    }

    pub fn to_json(&self) -> Value {
        if self.properties.is_empty() {
            return json!({});
        }
        json!({ "properties": properties_to_json(&self.properties) })
    }

    /// Checks every declared field present in `fields`.
    pub fn validate(&self, fields: &Fields) -> Result<(), MappingViolation> {
        validate_object(&self.properties, fields, "")
    }
}

fn parse_properties(value: &Value, prefix: &str) -> Result<BTreeMap<String, FieldMapping>, String> {
    let object = value
        .as_object()
        .ok_or_else(|| format!("`{prefix}properties` must be an object"))?;

    let mut properties = BTreeMap::new();
    for (name, definition) in object {
        let path = join_path(prefix, name);
        properties.insert(name.clone(), parse_field(definition, &path)?);
    }
    Ok(properties)
}

fn parse_field(definition: &Value, path: &str) -> Result<FieldMapping, String> {
    let object = definition
        .as_object()
        .ok_or_else(|| format!("mapping for `{path}` must be an object"))?;

    match (object.get("type").and_then(Value::as_str), object.get("properties")) {
        (Some("text"), None) => Ok(FieldMapping::Text),
        (Some("keyword"), None) => Ok(FieldMapping::Keyword),
        (Some("integer"), None) => Ok(FieldMapping::Integer),
        (Some("object") | None, Some(nested)) => Ok(FieldMapping::Object(parse_properties(
            nested,
            &format!("{path}."),
        )?)),
        (Some(other), _) => Err(format!("unsupported type `{other}` for `{path}`")),
        (None, None) => Err(format!("mapping for `{path}` needs `type` or `properties`")),
    }
}

fn properties_to_json(properties: &BTreeMap<String, FieldMapping>) -> Value {
    let mut object = Map::new();
    for (name, mapping) in properties {
        let definition = match mapping {
            FieldMapping::Text => json!({ "type": "text" }),
            FieldMapping::Keyword => json!({ "type": "keyword" }),
            FieldMapping::Integer => json!({ "type": "integer" }),
            FieldMapping::Object(nested) => json!({ "properties": properties_to_json(nested) }),
        };
        object.insert(name.clone(), definition);
    }
    Value::Object(object)
}

fn validate_object(
    properties: &BTreeMap<String, FieldMapping>,
    fields: &Fields,
    prefix: &str,
) -> Result<(), MappingViolation> {
    for (name, mapping) in properties {
        if let Some(value) = fields.get(name) {
            validate_value(mapping, value, &join_path(prefix, name))?;
        }
    }
    Ok(())
}

fn validate_value(mapping: &FieldMapping, value: &Value, path: &str) -> Result<(), MappingViolation> {
    // Arrays are transparent: every element must fit the field mapping.
    if let Value::Array(items) = value {
        return items
            .iter()
            .try_for_each(|item| validate_scalar(mapping, item, path));
    }
    validate_scalar(mapping, value, path)
}

fn validate_scalar(
    mapping: &FieldMapping,
    value: &Value,
    path: &str,
) -> Result<(), MappingViolation> {
    if value.is_null() {
        return Ok(());
    }

    match mapping {
        FieldMapping::Text | FieldMapping::Keyword => {
            if value.is_string() {
                Ok(())
            } else {
                Err(violation(path, "must be a string"))
            }
        }
        FieldMapping::Integer => match value.as_i64() {
            Some(number) if i32::try_from(number).is_ok() => Ok(()),
            Some(_) => Err(violation(path, "is out of 32-bit integer range")),
            None => Err(violation(path, "must be an integer")),
        },
        FieldMapping::Object(nested) => match value {
            Value::Object(object) => validate_object(nested, object, &format!("{path}.")),
            _ => Err(violation(path, "must be an object")),
        },
    }
}

fn violation(path: &str, message: &str) -> MappingViolation {
    MappingViolation {
        field: path.to_string(),
        message: message.to_string(),
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}")
}
