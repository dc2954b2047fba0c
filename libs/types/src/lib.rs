//! Types library for the order book feed
//!
//! Shared data model for the reconciliation engine and its consumers:
//! decimal helpers, sides, price levels, change events and the published
//! book state.
//!
//! # Modules
//! - `numeric`: Exact decimal parsing, ordering and accumulation
//! - `side`: Bid/ask side marker
//! - `level`: Price levels and per-side level maps
//! - `change`: Level size-change events
//! - `book`: Published order book state and view
//! - `errors`: Error taxonomy

pub mod book;
pub mod change;
pub mod errors;
pub mod level;
pub mod numeric;
pub mod side;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::book::*;
    pub use crate::change::*;
    pub use crate::errors::*;
    pub use crate::level::*;
    pub use crate::numeric::*;
    pub use crate::side::*;
}
