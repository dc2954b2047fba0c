//! Exact decimal helpers for prices and sizes
//!
//! Prices and sizes travel as text and keep their text identity; these
//! helpers interpret that text with `rust_decimal` whenever ordering or
//! arithmetic is needed, so repeated additions never drift the way binary
//! floating point would.
//!
//! Malformed text (empty, non-numeric, out of range) is read as zero rather
//! than rejected. A bad size on an unreliable feed must never stall the
//! pipeline.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::errors::BookError;

/// Parse decimal text, falling back to zero when it cannot be read.
///
/// Accepts plain notation (`"100.25"`, `"-3"`) and scientific notation
/// (`"1e-3"`).
pub fn parse_decimal(text: &str) -> Decimal {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

/// Render a decimal in canonical form (no trailing zeros, no `-0`).
pub fn render_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Compare two price strings by exact decimal value.
///
/// Numerically equal but textually distinct prices (`"100"` and `"100.0"`)
/// fall back to comparing the text, so the order is total over distinct
/// strings.
pub fn compare_prices(a: &str, b: &str) -> Ordering {
    parse_decimal(a)
        .cmp(&parse_decimal(b))
        .then_with(|| a.cmp(b))
}

/// Whether two sizes differ by strictly more than `epsilon`.
///
/// A difference too large to represent certainly exceeds any epsilon.
pub fn differs_by_more_than(old_size: &str, new_size: &str, epsilon: Decimal) -> bool {
    match parse_decimal(new_size).checked_sub(parse_decimal(old_size)) {
        Some(delta) => delta.abs() > epsilon,
        None => true,
    }
}

/// Whether a size string denotes resting volume (strictly positive).
pub fn is_positive(size: &str) -> bool {
    parse_decimal(size) > Decimal::ZERO
}

/// Running decimal sum of size strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accumulator {
    sum: Decimal,
}

impl Accumulator {
    /// Create an accumulator starting at zero.
    pub fn new() -> Self {
        Self { sum: Decimal::ZERO }
    }

    /// Add a size string to the running sum.
    pub fn add(&mut self, size: &str) -> Result<Decimal, BookError> {
        let operand = parse_decimal(size);
        self.sum = self
            .sum
            .checked_add(operand)
            .ok_or_else(|| BookError::Overflow {
                accumulated: self.sum.to_string(),
                operand: size.to_string(),
            })?;
        Ok(self.sum)
    }

    /// Current sum.
    pub fn total(&self) -> Decimal {
        self.sum
    }

    /// Current sum rendered in canonical form.
    pub fn render(&self) -> String {
        render_decimal(self.sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_plain_and_scientific() {
        assert_eq!(parse_decimal("100.25"), Decimal::new(10025, 2));
        assert_eq!(parse_decimal(" 7 "), Decimal::from(7));
        assert_eq!(parse_decimal("1e-3"), Decimal::new(1, 3));
        assert_eq!(parse_decimal("-2.5"), Decimal::new(-25, 1));
    }

    #[test]
    fn test_malformed_reads_as_zero() {
        assert_eq!(parse_decimal(""), Decimal::ZERO);
        assert_eq!(parse_decimal("abc"), Decimal::ZERO);
        assert_eq!(parse_decimal("1.2.3"), Decimal::ZERO);
        assert_eq!(parse_decimal("NaN"), Decimal::ZERO);
    }

    #[test]
    fn test_render_is_canonical() {
        assert_eq!(render_decimal(Decimal::new(70, 1)), "7");
        assert_eq!(render_decimal(Decimal::new(1050, 2)), "10.5");
        assert_eq!(render_decimal(Decimal::ZERO), "0");
    }

    #[test]
    fn test_compare_prices_numeric_not_lexical() {
        assert_eq!(compare_prices("99.5", "100.0"), Ordering::Less);
        assert_eq!(compare_prices("100.0", "99.5"), Ordering::Greater);
        assert_eq!(compare_prices("9", "10"), Ordering::Less);
    }

    #[test]
    fn test_compare_prices_tie_break_on_text() {
        assert_eq!(compare_prices("100", "100.0"), Ordering::Less);
        assert_eq!(compare_prices("100.0", "100"), Ordering::Greater);
        assert_eq!(compare_prices("100.0", "100.0"), Ordering::Equal);
    }

    #[test]
    fn test_epsilon_threshold() {
        let eps = Decimal::new(1, 4);
        assert!(!differs_by_more_than("1.0", "1.0001", eps));
        assert!(differs_by_more_than("1.0", "1.00011", eps));
        assert!(!differs_by_more_than("5", "5.0", eps));
        assert!(differs_by_more_than("3", "0", eps));
    }

    #[test]
    fn test_accumulator_exact() {
        let mut acc = Accumulator::new();
        for _ in 0..10 {
            acc.add("0.1").unwrap();
        }
        assert_eq!(acc.total(), Decimal::ONE);
        assert_eq!(acc.render(), "1");
    }

    #[test]
    fn test_accumulator_overflow() {
        let mut acc = Accumulator::new();
        acc.add("79228162514264337593543950335").unwrap();
        let err = acc.add("1").unwrap_err();
        assert!(matches!(err, BookError::Overflow { .. }));
    }

    proptest! {
        #[test]
        fn prop_compare_is_antisymmetric(a in 0u32..100_000, b in 0u32..100_000) {
            let left = format!("{}.{:02}", a / 100, a % 100);
            let right = format!("{}.{:02}", b / 100, b % 100);
            prop_assert_eq!(
                compare_prices(&left, &right),
                compare_prices(&right, &left).reverse()
            );
        }
    }
}
