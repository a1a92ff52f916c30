use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A good tradeable at the current station.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Product {
    pub symbol: String,
    #[serde(rename = "pricePerUnit")]
    pub price_per_unit: i32,
    #[serde(rename = "purchasePricePerUnit")]
    pub purchase_price_per_unit: i32,
    #[serde(rename = "sellPricePerUnit")]
    pub sell_price_per_unit: i32,
    pub spread: i32,
    #[serde(rename = "quantityAvailable")]
    pub quantity_available: i32,
    #[serde(rename = "volumePerUnit")]
    pub volume_per_unit: i32,
}

/// Products listed at one station, valid only for the instant it was fetched.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub location: String,
    products: Vec<Product>,
    by_symbol: HashMap<String, usize>,
}

impl MarketSnapshot {
    pub fn new(location: impl Into<String>, products: Vec<Product>) -> Self {
        let by_symbol = products
            .iter()
            .enumerate()
            .map(|(idx, product)| (product.symbol.clone(), idx))
            .collect();
        Self {
            location: location.into(),
            products,
            by_symbol,
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, symbol: &str) -> Option<&Product> {
        self.by_symbol.get(symbol).map(|idx| &self.products[*idx])
    }

    pub fn is_tradeable(&self, symbol: &str) -> bool {
        self.by_symbol.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
