//! Target row counts.
//!
//! Counts are written either as plain integers or as a decimal number with an
//! optional magnitude suffix: `500`, `10K`, `1.5M`, `2b`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How many rows a table producer should emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowCount {
    /// Exactly this many rows
    Bounded(u64),
    /// Keep producing until the input streams end or the run is cancelled
    #[default]
    Unbounded,
}

impl RowCount {
    /// Parse a row count pattern. Zero means unbounded.
    ///
    /// Returns `None` for malformed input.
    pub fn parse(input: &str) -> Option<RowCount> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        let (number, multiplier) = match trimmed.char_indices().last() {
            Some((idx, c)) if c.is_ascii_alphabetic() => {
                let multiplier: u64 = match c.to_ascii_uppercase() {
                    'K' => 1_000,
                    'M' => 1_000_000,
                    'B' | 'G' => 1_000_000_000,
                    'T' => 1_000_000_000_000,
                    _ => return None,
                };
                (trimmed[..idx].trim_end(), multiplier)
            }
            _ => (trimmed, 1),
        };

        if number.is_empty()
            || !number.chars().all(|c| c.is_ascii_digit() || c == '.')
            || number.matches('.').count() > 1
        {
            return None;
        }

        let rows = match number.split_once('.') {
            None => number.parse::<u64>().ok()?.checked_mul(multiplier)?,
            Some((whole, fraction)) => {
                let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
                let scale = 10u64.checked_pow(fraction.len() as u32)?;
                let fraction: u64 = if fraction.is_empty() {
                    0
                } else {
                    fraction.parse().ok()?
                };
                let whole_rows = whole.checked_mul(multiplier)?;
                let fraction_rows = fraction.checked_mul(multiplier)? / scale;
                whole_rows.checked_add(fraction_rows)?
            }
        };

        Some(RowCount::from(rows))
    }

    /// The bound, if any.
    pub fn limit(&self) -> Option<u64> {
        match self {
            RowCount::Bounded(n) => Some(*n),
            RowCount::Unbounded => None,
        }
    }

    /// Whether `produced` rows satisfy this count.
    pub fn is_reached(&self, produced: u64) -> bool {
        matches!(self, RowCount::Bounded(n) if produced >= *n)
    }
}

impl From<u64> for RowCount {
    fn from(rows: u64) -> Self {
        if rows == 0 {
            RowCount::Unbounded
        } else {
            RowCount::Bounded(rows)
        }
    }
}

impl fmt::Display for RowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowCount::Bounded(n) => write!(f, "{n}"),
            RowCount::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Row count as written in YAML, before parsing.
///
/// Any scalar deserializes; malformed values are rejected by [`resolve`] so
/// the error can name the table.
///
/// [`resolve`]: RowCountSpec::resolve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowCountSpec {
    /// Plain integer
    Rows(u64),
    /// Any other number, valid only when whole and non-negative
    Number(f64),
    /// Decimal-with-suffix pattern
    Pattern(String),
    /// Anything else
    Other(serde_yaml::Value),
}

impl RowCountSpec {
    /// Resolve to a row count, `None` when malformed.
    pub fn resolve(&self) -> Option<RowCount> {
        match self {
            RowCountSpec::Rows(n) => Some(RowCount::from(*n)),
            RowCountSpec::Number(n) => {
                let whole =
                    n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64;
                whole.then(|| RowCount::from(*n as u64))
            }
            RowCountSpec::Pattern(s) => RowCount::parse(s),
            RowCountSpec::Other(_) => None,
        }
    }
}

impl fmt::Display for RowCountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowCountSpec::Rows(n) => write!(f, "{n}"),
            RowCountSpec::Number(n) => write!(f, "{n}"),
            RowCountSpec::Pattern(s) => f.write_str(s),
            RowCountSpec::Other(value) => match serde_yaml::to_string(value) {
                Ok(text) => f.write_str(text.trim_end()),
                Err(_) => write!(f, "{value:?}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(RowCount::parse("500"), Some(RowCount::Bounded(500)));
        assert_eq!(RowCount::parse("0"), Some(RowCount::Unbounded));
    }

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(RowCount::parse("10K"), Some(RowCount::Bounded(10_000)));
        assert_eq!(RowCount::parse("1.5M"), Some(RowCount::Bounded(1_500_000)));
        assert_eq!(RowCount::parse("2b"), Some(RowCount::Bounded(2_000_000_000)));
        assert_eq!(RowCount::parse("0.25k"), Some(RowCount::Bounded(250)));
        assert_eq!(RowCount::parse("3 M"), Some(RowCount::Bounded(3_000_000)));
    }

    #[test]
    fn test_parse_malformed() {
        for input in ["", "M", "1.2.3K", "12X", "-5", "ten"] {
            assert_eq!(RowCount::parse(input), None, "input {input:?}");
        }
    }

    #[test]
    fn test_spec_from_yaml() {
        let spec: RowCountSpec = serde_yaml::from_str("1.5K").unwrap();
        assert_eq!(spec.resolve(), Some(RowCount::Bounded(1_500)));

        let spec: RowCountSpec = serde_yaml::from_str("250").unwrap();
        assert_eq!(spec.resolve(), Some(RowCount::Bounded(250)));
    }

    #[test]
    fn test_spec_accepts_any_scalar() {
        let spec: RowCountSpec = serde_yaml::from_str("2.0").unwrap();
        assert_eq!(spec.resolve(), Some(RowCount::Bounded(2)));

        for input in ["-5", "1.5", "-0.5", ".nan", "true", "[1, 2]"] {
            let spec: RowCountSpec = serde_yaml::from_str(input).unwrap();
            assert_eq!(spec.resolve(), None, "input {input:?}");
        }

        let spec: RowCountSpec = serde_yaml::from_str("-5").unwrap();
        assert_eq!(spec.to_string(), "-5");
        let spec: RowCountSpec = serde_yaml::from_str("1.5").unwrap();
        assert_eq!(spec.to_string(), "1.5");
    }

    #[test]
    fn test_is_reached() {
        assert!(RowCount::Bounded(3).is_reached(3));
        assert!(!RowCount::Bounded(3).is_reached(2));
        assert!(!RowCount::Unbounded.is_reached(u64::MAX));
    }
}
