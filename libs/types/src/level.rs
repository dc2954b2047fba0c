//! Price levels and per-side level maps

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::numeric::parse_decimal;

/// Last known size per price for one side, keyed by price text.
///
/// Holds the full level set from the most recent batch, including
/// zero-size removals, so the next batch can be diffed against it.
pub type LevelMap = BTreeMap<String, String>;

/// A single displayed price level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Price as received; also the level's identity within its side.
    pub price: String,
    /// Resting size as received.
    pub size: String,
    /// Cumulative size from the best price through this level.
    pub total: String,
}

impl PriceLevel {
    /// Create a level whose running total has not been computed yet.
    pub fn new(price: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            size: size.into(),
            total: "0".to_string(),
        }
    }

    /// Price as an exact decimal.
    pub fn price_decimal(&self) -> Decimal {
        parse_decimal(&self.price)
    }

    /// Size as an exact decimal.
    pub fn size_decimal(&self) -> Decimal {
        parse_decimal(&self.size)
    }

    /// Running total as an exact decimal.
    pub fn total_decimal(&self) -> Decimal {
        parse_decimal(&self.total)
    }
}
