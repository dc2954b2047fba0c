//! Running totals for a ladder

use types::errors::BookError;
use types::level::PriceLevel;
use types::numeric::Accumulator;

/// Set each level's `total` to the cumulative size from the best level
/// through itself.
///
/// Levels must already be best-first. Fails only if the running sum
/// overflows the decimal range.
pub fn with_totals(mut levels: Vec<PriceLevel>) -> Result<Vec<PriceLevel>, BookError> {
    let mut running = Accumulator::new();
    for level in &mut levels {
        running.add(&level.size)?;
        level.total = running.render();
    }
    Ok(levels)
}
