//! Species aggregate.

use super::taxon::{MalformedTaxonName, TaxonHistory, TaxonName};
use super::Reference;
use serde::Serialize;

/// A plant species tracked by its scientific-name history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Species {
    pub reference: Option<Reference>,
    pub taxon_history: TaxonHistory,
}

impl Species {
    /// Creates an unreferenced species from a scientific name.
    pub fn new(current_name: &str) -> Result<Self, MalformedTaxonName> {
        Ok(Self {
            reference: None,
            taxon_history: TaxonHistory::new(TaxonName::parse(current_name)?),
        })
    }

    pub fn with_reference(
        current_name: &str,
        reference: impl Into<Reference>,
    ) -> Result<Self, MalformedTaxonName> {
        let mut species = Self::new(current_name)?;
        species.reference = Some(reference.into());
        Ok(species)
    }

    pub fn current_name(&self) -> &TaxonName {
        self.taxon_history.current()
    }

    /// Replaces the current scientific name, keeping the old one as history.
    pub fn rename(&mut self, new_name: &str) -> Result<(), MalformedTaxonName> {
        self.taxon_history
            .new_current_name(TaxonName::parse(new_name)?);
        Ok(())
    }
}
