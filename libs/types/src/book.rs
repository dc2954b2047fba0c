//! Published order book state
//!
//! What consumers see: two bounded, best-first ladders with running totals
//! and the sequence of the update that produced them. Published as a whole
//! value and never mutated afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::change::ValueChange;
use crate::level::PriceLevel;

/// Displayable projection of the book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookState {
    /// Bid levels in descending price order (best first).
    pub bids: Vec<PriceLevel>,
    /// Ask levels in ascending price order (best first).
    pub asks: Vec<PriceLevel>,
    /// Sequence of the update this state reflects (0 before any update).
    pub sequence: u64,
}

impl OrderBookState {
    /// Empty book at sequence 0.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Best (highest) bid price.
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    /// Best (lowest) ask price.
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Spread between best ask and best bid.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => ask.price_decimal().checked_sub(bid.price_decimal()),
            _ => None,
        }
    }

    /// Whether neither side has any level.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Everything a presentation collaborator reads in one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookView {
    pub book: OrderBookState,
    /// Recent level changes, newest first.
    pub changes: Vec<ValueChange>,
}
