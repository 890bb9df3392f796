//! Column values and declared column types.
//!
//! A [`ColumnValue`] is the tagged union every engine in rowsync pattern
//! matches on; exactly one variant is ever active and there is no runtime
//! type sniffing anywhere downstream. Large text is carried as an owned,
//! already-materialized string: streamed sources are read exactly once at
//! the fetch boundary (see [`crate::normalize::materialize_large`]).

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A date or date-and-time value.
///
/// The two granularities are kept distinct because they serialize to SQL
/// with different format strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Temporal {
    /// Date without a time component.
    Date(NaiveDate),
    /// Date and time, second precision.
    DateTime(NaiveDateTime),
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// A single scalar value fetched from (or destined for) a relational source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValue {
    /// SQL NULL.
    Null,
    /// Exact numeric value.
    Numeric(BigDecimal),
    /// Date or date-time value.
    Temporal(Temporal),
    /// Inline text.
    Text(String),
    /// Large text, materialized from a streamed source.
    ///
    /// Never compared byte-for-byte against [`ColumnValue::Text`]; the
    /// normalizer collapses both variants into one comparison form.
    LargeText(String),
}

impl ColumnValue {
    /// Returns true for [`ColumnValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Builds a numeric value from an integer.
    #[must_use]
    pub fn integer(n: i64) -> Self {
        Self::Numeric(BigDecimal::from(n))
    }

    /// Builds a text value.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Canonical text form of the value, or `None` for NULL.
    ///
    /// Numerics render with trailing zeros removed, temporals with the
    /// formats in [`Temporal`]'s `Display`. This is the representation key
    /// tuples and the in-memory fetcher match against.
    #[must_use]
    pub fn canonical_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Numeric(d) => Some(d.clone().normalized().to_string()),
            Self::Temporal(t) => Some(t.to_string()),
            Self::Text(s) | Self::LargeText(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for ColumnValue {
    /// Renders the canonical text form; NULL renders as the empty string,
    /// matching the diff report's empty cells.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical_text() {
            Some(s) => f.write_str(&s),
            None => Ok(()),
        }
    }
}

/// Column type as declared by the source.
///
/// Serialization dispatches on the declared type, not on the value tag: a
/// column declared large-text routes through scratch variables even when a
/// particular value happens to be short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclaredType {
    /// Numeric column (integer or decimal).
    Numeric,
    /// Date column (no time component).
    Date,
    /// Date-and-time column.
    DateTime,
    /// Inline text column.
    Text,
    /// Large-text column (CLOB-like); values cannot be inlined as literals.
    LargeText,
}

impl DeclaredType {
    /// Returns true for large-text columns.
    #[must_use]
    pub fn is_large_text(&self) -> bool {
        matches!(self, Self::LargeText)
    }
}
