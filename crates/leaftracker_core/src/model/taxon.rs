//! Scientific names and their revision history.

use serde::{Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Name that is not two or three whitespace-separated ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedTaxonName {
    pub name: String,
}

impl Display for MalformedTaxonName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "malformed taxon name `{}`: expected genus, species and optionally subspecies",
            self.name
        )
    }
}

impl Error for MalformedTaxonName {}

/// Binomial or trinomial scientific name in normalized case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaxonName {
    genus: String,
    species: String,
    subspecies: Option<String>,
}

impl TaxonName {
    /// Parses `Genus species [subspecies]`, normalizing case.
    pub fn parse(name: &str) -> Result<Self, MalformedTaxonName> {
        let ranks: Vec<&str> = name.split_whitespace().collect();
        match ranks.as_slice() {
            [genus, species] => Ok(Self::from_ranks(genus, species, None)),
            [genus, species, subspecies] => {
                Ok(Self::from_ranks(genus, species, Some(subspecies)))
            }
            _ => Err(MalformedTaxonName {
                name: name.to_string(),
            }),
        }
    }

    fn from_ranks(genus: &str, species: &str, subspecies: Option<&str>) -> Self {
        Self {
            genus: capitalize(genus),
            species: species.to_lowercase(),
            subspecies: subspecies.map(str::to_lowercase),
        }
    }

    pub fn genus(&self) -> &str {
        &self.genus
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn subspecies(&self) -> Option<&str> {
        self.subspecies.as_deref()
    }
}

impl Display for TaxonName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.genus, self.species)?;
        if let Some(subspecies) = &self.subspecies {
            write!(f, " {subspecies}")?;
        }
        Ok(())
    }
}

impl Serialize for TaxonName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn capitalize(value: &str) -> String {
    let lower = value.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Current scientific name plus every name it superseded, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonHistory {
    current: TaxonName,
    previous: Vec<TaxonName>,
}

impl TaxonHistory {
    pub fn new(current: TaxonName) -> Self {
        Self {
            current,
            previous: Vec::new(),
        }
    }

    pub fn current(&self) -> &TaxonName {
        &self.current
    }

    pub fn previous(&self) -> impl Iterator<Item = &TaxonName> {
        self.previous.iter()
    }

    /// Makes `name` current and moves the old current name into history.
    pub fn new_current_name(&mut self, name: TaxonName) {
        let superseded = std::mem::replace(&mut self.current, name);
        self.previous.push(superseded);
    }

    /// Records an older name without changing the current one.
    pub fn add_previous_name(&mut self, name: TaxonName) {
        self.previous.push(name);
    }

    /// Previous names followed by the current name.
    pub fn names(&self) -> impl Iterator<Item = &TaxonName> {
        self.previous.iter().chain(std::iter::once(&self.current))
    }
}
