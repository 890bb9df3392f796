//! Value serialization: column value + declared type to SQL expression.
//!
//! The declared column type, not the value tag, decides the route: a column
//! declared large-text always goes through a scratch variable, because the
//! host dialect cannot inline such values as literals.

use rowsync_core::value::{ColumnValue, DeclaredType};

use crate::literal;
use crate::scratch::ScratchPool;
use crate::statement::DmlStatement;

/// The result of serializing one value.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedValue {
    /// Expression to splice into the consuming statement: a literal, a
    /// date-construction call, or a scratch variable reference.
    pub expr: String,
    /// Assignment statements that must run before the consuming statement.
    /// At most one per allocated scratch variable per row specification.
    pub assignments: Vec<DmlStatement>,
}

impl SerializedValue {
    fn inline(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            assignments: Vec::new(),
        }
    }
}

/// Serializes `value` for a column of the given declared type.
///
/// - NULL serializes to the literal `NULL` regardless of declared type.
/// - Large-text columns allocate a scratch variable from `pool` and emit
///   one assignment binding it to the text.
/// - Numerics render unquoted in canonical decimal form.
/// - Temporals render as date-construction expressions whose format string
///   matches the value's granularity.
/// - Everything else renders as a quoted, escaped string literal.
#[must_use]
pub fn serialize_value(
    value: &ColumnValue,
    declared: DeclaredType,
    pool: &mut ScratchPool,
) -> SerializedValue {
    if value.is_null() {
        return SerializedValue::inline("NULL");
    }

    if declared.is_large_text() {
        let var = pool.allocate().to_string();
        let text = value.canonical_text().unwrap_or_default();
        return SerializedValue {
            expr: var.clone(),
            assignments: vec![DmlStatement::AssignScratch { var, text }],
        };
    }

    match value {
        ColumnValue::Numeric(d) => {
            SerializedValue::inline(d.clone().normalized().to_string())
        }
        ColumnValue::Temporal(t) => SerializedValue::inline(literal::date_expr(t)),
        ColumnValue::Text(s) | ColumnValue::LargeText(s) => {
            SerializedValue::inline(literal::quote(s))
        }
        // is_null() returned above.
        ColumnValue::Null => SerializedValue::inline("NULL"),
    }
}
