//! Ingestion layer for raw feed messages
//!
//! Turns a raw JSON message into a typed [`BookUpdate`]. Only the envelope
//! can make a message invalid: it must be an object carrying a numeric,
//! non-negative integer `sequence`. Everything below the envelope is read
//! leniently:
//! - a `bids`/`asks` field that is missing or not an array is an empty side
//! - a pair that is not a two-element array is dropped
//! - price/size may be JSON strings or numbers; null and empty text read as
//!   `"0"`; any other element type drops the pair

use serde_json::Value;
use tracing::debug;

use crate::events::{BookUpdate, RawLevel};

/// Reasons a raw message cannot become an update.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestionError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has no sequence field")]
    MissingSequence,

    #[error("sequence is not a non-negative integer: {0}")]
    InvalidSequence(String),
}

/// Parse a raw message into an update.
pub fn parse_update(raw: &Value) -> Result<BookUpdate, IngestionError> {
    let object = raw.as_object().ok_or(IngestionError::NotAnObject)?;
    let sequence = parse_sequence(object.get("sequence"))?;

    let (bids, dropped_bids) = parse_side(object.get("bids"));
    let (asks, dropped_asks) = parse_side(object.get("asks"));

    if dropped_bids + dropped_asks > 0 {
        debug!(
            sequence,
            dropped_bids, dropped_asks, "Dropped malformed level pairs"
        );
    }

    Ok(BookUpdate {
        bids,
        asks,
        sequence,
    })
}

fn parse_sequence(field: Option<&Value>) -> Result<u64, IngestionError> {
    let value = field.ok_or(IngestionError::MissingSequence)?;
    let number = match value {
        Value::Number(number) => number,
        other => return Err(IngestionError::InvalidSequence(other.to_string())),
    };

    if let Some(sequence) = number.as_u64() {
        return Ok(sequence);
    }

    // Integral floats ("42.0") are accepted; fractions and negatives are not.
    match number.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
            Ok(f as u64)
        }
        _ => Err(IngestionError::InvalidSequence(number.to_string())),
    }
}

/// Returns the well-formed levels and the number of dropped pairs.
fn parse_side(field: Option<&Value>) -> (Vec<RawLevel>, usize) {
    let Some(Value::Array(pairs)) = field else {
        return (Vec::new(), 0);
    };

    let mut levels = Vec::with_capacity(pairs.len());
    let mut dropped = 0;
    for pair in pairs {
        match parse_pair(pair) {
            Some(level) => levels.push(level),
            None => dropped += 1,
        }
    }
    (levels, dropped)
}

fn parse_pair(pair: &Value) -> Option<RawLevel> {
    match pair.as_array()?.as_slice() {
        [price, size] => Some(RawLevel {
            price: field_text(price)?,
            size: field_text(size)?,
        }),
        _ => None,
    }
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if text.is_empty() => Some("0".to_string()),
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Null => Some("0".to_string()),
        _ => None,
    }
}
