//! Join keys.

use std::fmt;

use popcal_core::errors::{CalibError, ErrorInfo};
use serde::{Deserialize, Serialize};

/// Composite `(year, col, row)` key identifying one spatial cell in one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// Simulation year.
    pub year: i64,
    /// Grid column.
    pub col: i64,
    /// Grid row.
    pub row: i64,
}

impl RecordKey {
    /// Creates a key from its components.
    pub const fn new(year: i64, col: i64, row: i64) -> Self {
        Self { year, col, row }
    }

    /// Parses the three key fields of a table row.
    pub fn parse(year: &str, col: &str, row: &str) -> Result<Self, CalibError> {
        Ok(Self {
            year: parse_key_field("year", year)?,
            col: parse_key_field("col", col)?,
            row: parse_key_field("row", row)?,
        })
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.year, self.col, self.row)
    }
}

/// Parses an integer key field, accepting integral floats such as `2019.0`.
pub fn parse_key_field(field: &str, raw: &str) -> Result<i64, CalibError> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }
    let invalid = || {
        CalibError::Data(
            ErrorInfo::new("key-not-integer", "key field is not an integer")
                .with_context("field", field)
                .with_context("value", trimmed),
        )
    };
    let value = trimmed.parse::<f64>().map_err(|_| invalid())?;
    if !value.is_finite() || value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(value as i64)
}
