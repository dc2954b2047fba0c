//! Order Book Feed
//!
//! Reconciles an unreliable stream of sequenced level batches into a
//! bounded, best-first view of one order book, plus a rolling log of level
//! size changes:
//! - Sequence gating: stale and duplicate updates never regress the view
//! - Per-side level diffs against the last accepted batch
//! - Depth-bounded ladders with exact running totals
//! - Bounded newest-first change history
//! - Throttled publication that coalesces bursts to the newest update
//!
//! # Architecture
//!
//! ```text
//!   FeedSource (transport)
//!        │ raw JSON
//!   ┌────▼─────┐
//!   │ Ingest   │  ← envelope checks, lenient level parsing
//!   └────┬─────┘
//!   ┌────▼─────┐
//!   │ Throttle │  ← one pass per interval, depth-one pending slot
//!   └────┬─────┘
//!   ┌────▼──────────────┐
//!   │ BookReconciler    │  ← sequence gate, commit/publish
//!   │  ├ delta (x2)     │
//!   │  ├ totals (x2)    │
//!   │  └ history        │
//!   └────┬──────────────┘
//!        │ Arc<BookView>
//!   BookReader (presentation)
//! ```

pub mod config;
pub mod delta;
pub mod events;
pub mod history;
pub mod ingestion;
pub mod metrics;
pub mod order_book;
pub mod service;
pub mod source;
pub mod throttle;
pub mod totals;

pub use config::FeedConfig;
pub use order_book::{ApplyOutcome, BookReconciler};
pub use service::{spawn, BookReader, FeedHandle, FeedSender};
pub use source::{FeedError, FeedSource, JsonLinesSource};

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
