//! Field extraction helpers shared by document-to-aggregate conversions.

use crate::document::Fields;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Document payload that does not have the shape its aggregate needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentShapeError {
    /// Dotted path of the offending field, e.g. `stock[1].size`.
    pub field: String,
    pub message: String,
}

impl DocumentShapeError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Prefixes the field path with an array element of `parent`.
    pub fn within(self, parent: &str, position: usize) -> Self {
        Self {
            field: format!("{parent}[{position}].{}", self.field),
            message: self.message,
        }
    }
}

impl Display for DocumentShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "field `{}` {}", self.field, self.message)
    }
}

impl Error for DocumentShapeError {}

pub type ShapeResult<T> = Result<T, DocumentShapeError>;

pub(crate) fn required<'d>(fields: &'d Fields, field: &str) -> ShapeResult<&'d Value> {
    fields
        .get(field)
        .ok_or_else(|| DocumentShapeError::new(field, "is missing"))
}

pub(crate) fn required_str<'d>(fields: &'d Fields, field: &str) -> ShapeResult<&'d str> {
    required(fields, field)?
        .as_str()
        .ok_or_else(|| DocumentShapeError::new(field, "must be a string"))
}

pub(crate) fn required_array<'d>(fields: &'d Fields, field: &str) -> ShapeResult<&'d [Value]> {
    required(fields, field)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| DocumentShapeError::new(field, "must be an array"))
}

pub(crate) fn required_u32(fields: &Fields, field: &str) -> ShapeResult<u32> {
    let number = required(fields, field)?
        .as_u64()
        .ok_or_else(|| DocumentShapeError::new(field, "must be a non-negative integer"))?;
    u32::try_from(number).map_err(|_| DocumentShapeError::new(field, "is out of range"))
}

/// Strings of an array field, one per element.
pub(crate) fn string_array<'d>(fields: &'d Fields, field: &str) -> ShapeResult<Vec<&'d str>> {
    required_array(fields, field)?
        .iter()
        .enumerate()
        .map(|(position, value)| {
            value.as_str().ok_or_else(|| {
                DocumentShapeError::new(format!("{field}[{position}]"), "must be a string")
            })
        })
        .collect()
}

/// Parses an enum-as-string field with a caller-provided decoder.
pub(crate) fn required_enum<T>(
    fields: &Fields,
    field: &str,
    parse: fn(&str) -> Option<T>,
) -> ShapeResult<T> {
    let value = required_str(fields, field)?;
    parse(value).ok_or_else(|| DocumentShapeError::new(field, format!("has unknown value `{value}`")))
}
