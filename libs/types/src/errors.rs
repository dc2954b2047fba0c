//! Error types for the order book feed
//!
//! Failures that can occur while reconciling levels. Malformed numeric text
//! is not an error (it reads as zero); these cover the cases where a pass
//! cannot produce a trustworthy result and must be discarded.

use thiserror::Error;

/// Processing failure inside a reconciliation pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    #[error("decimal overflow: cannot add {operand} to running total {accumulated}")]
    Overflow { accumulated: String, operand: String },

    #[error("ladder invariant violated on {side}: {reason}")]
    LadderInvariant { side: String, reason: String },
}
