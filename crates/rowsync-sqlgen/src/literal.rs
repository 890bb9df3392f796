//! Centralized SQL literal escaping and rendering.
//!
//! Every piece of text that ends up inside a generated statement passes
//! through this module, so the escaping rules live in exactly one place.
//!
//! Known weakness: escaping is single-quote doubling only. Values containing
//! control characters or dialect-specific metacharacters other than `'` pass
//! through unchanged, and key predicates are built from literals rather than
//! bound parameters. This matches the generated-script format consumers
//! expect; do not feed these builders untrusted input.

use rowsync_core::value::Temporal;

/// Doubles single quotes in `text`.
#[must_use]
pub fn escape(text: &str) -> String {
    text.replace('\'', "''")
}

/// Renders `text` as a quoted SQL string literal.
#[must_use]
pub fn quote(text: &str) -> String {
    format!("'{}'", escape(text))
}

/// Renders a date-construction expression with an explicit format string.
///
/// Date-only and date-and-time values carry different format masks so the
/// target dialect reconstructs exactly the granularity that was fetched.
#[must_use]
pub fn date_expr(value: &Temporal) -> String {
    match value {
        Temporal::Date(d) => {
            format!("TO_DATE('{}', 'YYYY-MM-DD')", d.format("%Y-%m-%d"))
        }
        Temporal::DateTime(dt) => format!(
            "TO_DATE('{}', 'YYYY-MM-DD HH24:MI:SS')",
            dt.format("%Y-%m-%d %H:%M:%S")
        ),
    }
}

/// Builds an equality predicate over key bindings: `K1 = 'v1' AND K2 = 'v2'`.
///
/// Values are escaped as literals by design (see the module note); the same
/// predicate text guards every statement emitted for one row specification.
#[must_use]
pub fn key_predicate(bindings: &[(String, String)]) -> String {
    bindings
        .iter()
        .map(|(column, value)| format!("{column} = {}", quote(value)))
        .collect::<Vec<_>>()
        .join(" AND ")
}
