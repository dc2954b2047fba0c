//! Book side marker

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::numeric::compare_prices;

/// Side of the book a level rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Resting buy volume; best price is the highest.
    Bid,
    /// Resting sell volume; best price is the lowest.
    Ask,
}

impl Side {
    /// Lowercase label used in logs and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }

    /// Best-first ordering of two prices on this side.
    ///
    /// Bids sort descending, asks ascending.
    pub fn ladder_order(&self, a: &str, b: &str) -> Ordering {
        match self {
            Side::Bid => compare_prices(b, a),
            Side::Ask => compare_prices(a, b),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
