//! Inbound update definitions
//!
//! A `BookUpdate` is one sequenced batch of levels from the feed, already
//! shape-checked by the ingestion layer. The channel between transport and
//! engine carries raw JSON; only ingestion produces these.

use types::side::Side;

/// One (price, size) pair as received, text preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLevel {
    pub price: String,
    pub size: String,
}

impl RawLevel {
    pub fn new(price: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            size: size.into(),
        }
    }
}

/// A sequenced batch of levels for both sides.
///
/// Each side's batch is the complete level set for that side as of
/// `sequence`; a price missing from the batch is treated as removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookUpdate {
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
    /// Monotonic recency marker from the feed.
    pub sequence: u64,
}

impl BookUpdate {
    /// Build an update from `(price, size)` string pairs.
    pub fn from_pairs(sequence: u64, bids: &[(&str, &str)], asks: &[(&str, &str)]) -> Self {
        let convert = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(price, size)| RawLevel::new(*price, *size))
                .collect()
        };
        Self {
            bids: convert(bids),
            asks: convert(asks),
            sequence,
        }
    }

    /// Levels for one side.
    pub fn side(&self, side: Side) -> &[RawLevel] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Total number of levels across both sides.
    pub fn level_count(&self) -> usize {
        self.bids.len() + self.asks.len()
    }
}
