//! Source-of-stock aggregate: where plants come from.

use super::Reference;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Commercial or community nursery.
    Nursery,
    /// Planting program that hands out stock.
    Program,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceOfStock {
    pub reference: Option<Reference>,
    pub current_name: String,
    pub source_type: SourceType,
}

impl SourceOfStock {
    pub fn new(current_name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            reference: None,
            current_name: current_name.into(),
            source_type,
        }
    }

    pub fn with_reference(
        current_name: impl Into<String>,
        source_type: SourceType,
        reference: impl Into<Reference>,
    ) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::new(current_name, source_type)
        }
    }
}
