//! Batch aggregate: one order, delivery or pickup of stock from a source.

use super::Reference;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchType {
    Order,
    Delivery,
    Pickup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockSize {
    Tube,
    Pot,
}

/// Quantity of one species at one container size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stock {
    pub species_reference: Reference,
    pub quantity: u32,
    pub size: StockSize,
}

impl Stock {
    pub fn new(species_reference: impl Into<Reference>, quantity: u32, size: StockSize) -> Self {
        Self {
            species_reference: species_reference.into(),
            quantity,
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    pub reference: Option<Reference>,
    pub source_reference: Reference,
    pub batch_type: BatchType,
    pub stock: Vec<Stock>,
}

impl Batch {
    pub fn new(source_reference: impl Into<Reference>, batch_type: BatchType) -> Self {
        Self {
            reference: None,
            source_reference: source_reference.into(),
            batch_type,
            stock: Vec::new(),
        }
    }

    pub fn with_reference(
        source_reference: impl Into<Reference>,
        batch_type: BatchType,
        reference: impl Into<Reference>,
    ) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::new(source_reference, batch_type)
        }
    }

    /// Appends a stock line; lines for the same species are kept separate.
    pub fn add(&mut self, stock: Stock) {
        self.stock.push(stock);
    }

    /// Species references in stock-line order, without duplicates.
    pub fn species(&self) -> Vec<&str> {
        let mut species: Vec<&str> = Vec::new();
        for line in &self.stock {
            if !species.contains(&line.species_reference.as_str()) {
                species.push(line.species_reference.as_str());
            }
        }
        species
    }

    /// Total quantity of one species across all sizes.
    pub fn quantity(&self, species_reference: &str) -> u64 {
        self.sum_where(|line| line.species_reference == species_reference)
    }

    pub fn quantity_of_size(&self, species_reference: &str, size: StockSize) -> u64 {
        self.sum_where(|line| line.species_reference == species_reference && line.size == size)
    }

    fn sum_where(&self, predicate: impl Fn(&Stock) -> bool) -> u64 {
        self.stock
            .iter()
            .filter(|line| predicate(*line))
            .map(|line| u64::from(line.quantity))
            .sum()
    }
}
