//! Value normalization for comparison.
//!
//! Reconciliation never compares raw values: both sides are passed through
//! [`normalize`] first, and the original values are kept only for reporting.
//! Normalization is idempotent: `normalize(normalize(v)) == normalize(v)`
//! for every value and mode.

use tracing::warn;

use crate::value::ColumnValue;

/// Whether string values are stripped of whitespace before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StripMode {
    /// Remove every whitespace character (space, tab, newline, carriage
    /// return) from text values. This is the default: trailing padding and
    /// reformatted line breaks are the most common source of spurious diffs
    /// between otherwise identical snapshots.
    #[default]
    Strip,
    /// Compare text values exactly as fetched.
    Preserve,
}

impl StripMode {
    /// Returns true when whitespace stripping is enabled.
    #[must_use]
    pub fn is_strip(&self) -> bool {
        matches!(self, Self::Strip)
    }
}

/// Canonicalizes a value for comparison.
///
/// - NULL passes through.
/// - Numeric values lose insignificant trailing zeros.
/// - Temporal values are already canonical.
/// - Text and large text collapse into [`ColumnValue::Text`], stripped of
///   all whitespace when `mode` is [`StripMode::Strip`]. Collapsing the tag
///   is what lets a large-text value compare equal to an inline text value
///   with the same content.
#[must_use]
pub fn normalize(value: &ColumnValue, mode: StripMode) -> ColumnValue {
    match value {
        ColumnValue::Null => ColumnValue::Null,
        ColumnValue::Numeric(d) => ColumnValue::Numeric(d.clone().normalized()),
        ColumnValue::Temporal(t) => ColumnValue::Temporal(*t),
        ColumnValue::Text(s) | ColumnValue::LargeText(s) => {
            ColumnValue::Text(strip_text(s, mode))
        }
    }
}

fn strip_text(s: &str, mode: StripMode) -> String {
    match mode {
        StripMode::Strip => s.chars().filter(|c| !c.is_whitespace()).collect(),
        StripMode::Preserve => s.to_string(),
    }
}

/// Materializes a streamed large-text value into a [`ColumnValue`].
///
/// Called exactly once per value at the fetch boundary. Invalid UTF-8 is
/// decoded with the replacement character; a failed read recovers as NULL so
/// one unreadable value cannot abort a whole reconciliation or synthesis
/// run. The recovery is logged, and a NULL produced this way may later show
/// up as a mismatch against a readable value on the other side.
#[must_use]
pub fn materialize_large(bytes: std::io::Result<Vec<u8>>) -> ColumnValue {
    match bytes {
        Ok(buf) => ColumnValue::LargeText(String::from_utf8_lossy(&buf).into_owned()),
        Err(err) => {
            warn!(error = %err, "failed to read large value, treating as NULL");
            ColumnValue::Null
        }
    }
}
