//! The reconciliation engine.
//!
//! Compares two keyed snapshots and emits diff entries in a deterministic
//! order: the left snapshot is walked first (mismatches and rows missing on
//! the right, in left insertion order), then the right snapshot (rows
//! missing on the left, in right insertion order).

use serde::Serialize;
use tracing::debug;

use rowsync_core::key::{KeyError, KeyTuple, KeyedRowMap};
use rowsync_core::normalize::{normalize, StripMode};
use rowsync_core::row::Row;
use rowsync_core::value::ColumnValue;

/// One unit of detected divergence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DiffEntry {
    /// The key exists on the left but not on the right.
    RowMissingInRight {
        /// Key of the missing row.
        key: KeyTuple,
    },
    /// The key exists on the right but not on the left.
    RowMissingInLeft {
        /// Key of the missing row.
        key: KeyTuple,
    },
    /// Both sides have the row but a column's values differ.
    ///
    /// Carries the original (non-normalized) values even though the
    /// comparison ran on normalized ones.
    ColumnMismatch {
        /// Key of the diverging row.
        key: KeyTuple,
        /// Column whose values differ.
        column: String,
        /// Value fetched from the left source.
        left: ColumnValue,
        /// Value fetched from the right source.
        right: ColumnValue,
    },
}

/// Immutable, discovery-ordered result of one reconciliation run.
#[derive(Debug, Default, Serialize)]
pub struct DiffReport {
    entries: Vec<DiffEntry>,
}

impl DiffReport {
    /// Entries in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter()
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the snapshots were identical under normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of column mismatches.
    #[must_use]
    pub fn mismatch_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, DiffEntry::ColumnMismatch { .. }))
            .count()
    }

    /// Number of rows missing on the right.
    #[must_use]
    pub fn missing_in_right_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, DiffEntry::RowMissingInRight { .. }))
            .count()
    }

    /// Number of rows missing on the left.
    #[must_use]
    pub fn missing_in_left_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, DiffEntry::RowMissingInLeft { .. }))
            .count()
    }
}

/// Reconciles two keyed snapshots of one table.
#[derive(Debug, Clone)]
pub struct Reconciler {
    key_columns: Vec<String>,
    strip_mode: StripMode,
}

impl Reconciler {
    /// Creates a reconciler keyed by the given columns, stripping
    /// whitespace before comparison (the default).
    #[must_use]
    pub fn new(key_columns: Vec<String>) -> Self {
        Self {
            key_columns,
            strip_mode: StripMode::default(),
        }
    }

    /// Overrides the whitespace handling used for comparison.
    #[must_use]
    pub fn strip_mode(mut self, mode: StripMode) -> Self {
        self.strip_mode = mode;
        self
    }

    /// The declared key columns.
    #[must_use]
    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// Indexes one snapshot's rows by the declared key columns.
    pub fn index(&self, rows: Vec<Row>) -> Result<KeyedRowMap, KeyError> {
        rowsync_core::key::index_rows(rows, &self.key_columns)
    }

    /// Compares two keyed snapshots.
    ///
    /// Column sets are assumed aligned; a column absent from the right row
    /// compares against NULL, which can surface as a DIFF entry. An
    /// unreadable large value arrives here already recovered as NULL and
    /// participates in comparison as such.
    #[must_use]
    pub fn reconcile(&self, left: &KeyedRowMap, right: &KeyedRowMap) -> DiffReport {
        let mut entries = Vec::new();

        for (key, left_row) in left.iter() {
            let Some(right_row) = right.get(key) else {
                entries.push(DiffEntry::RowMissingInRight { key: key.clone() });
                continue;
            };

            for column in left_row.columns() {
                let right_value = right_row
                    .get(&column.name)
                    .map_or(ColumnValue::Null, |c| c.value.clone());

                let left_norm = normalize(&column.value, self.strip_mode);
                let right_norm = normalize(&right_value, self.strip_mode);
                if left_norm != right_norm {
                    entries.push(DiffEntry::ColumnMismatch {
                        key: key.clone(),
                        column: column.name.clone(),
                        left: column.value.clone(),
                        right: right_value,
                    });
                }
            }
        }

        for key in right.keys() {
            if !left.contains_key(key) {
                entries.push(DiffEntry::RowMissingInLeft { key: key.clone() });
            }
        }

        debug!(
            left_rows = left.len(),
            right_rows = right.len(),
            entries = entries.len(),
            "reconciliation pass complete"
        );
        DiffReport { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowsync_core::key::index_rows;
    use rowsync_core::value::DeclaredType;

    fn row(id: i64, name: &str) -> Row {
        Row::new()
            .with_column("ID", DeclaredType::Numeric, ColumnValue::integer(id))
            .with_column("NAME", DeclaredType::Text, ColumnValue::text(name))
    }

    fn keyed(rows: Vec<Row>) -> KeyedRowMap {
        index_rows(rows, &["ID".to_string()]).unwrap()
    }

    fn reconciler() -> Reconciler {
        Reconciler::new(vec!["ID".to_string()])
    }

    #[test]
    fn test_identical_snapshots_are_clean() {
        let left = keyed(vec![row(1, "a"), row(2, "b")]);
        let right = keyed(vec![row(1, "a"), row(2, "b")]);
        let report = reconciler().reconcile(&left, &right);
        assert!(report.is_empty());
    }

    #[test]
    fn test_missing_sets_match_key_difference() {
        let left = keyed(vec![row(1, "a"), row(2, "b")]);
        let right = keyed(vec![row(2, "b"), row(3, "c")]);
        let report = reconciler().reconcile(&left, &right);

        assert_eq!(report.missing_in_right_count(), 1);
        assert_eq!(report.missing_in_left_count(), 1);

        let kinds: Vec<&DiffEntry> = report.iter().collect();
        assert!(
            matches!(kinds[0], DiffEntry::RowMissingInRight { key } if key.to_string() == "(1)")
        );
        assert!(
            matches!(kinds[1], DiffEntry::RowMissingInLeft { key } if key.to_string() == "(3)")
        );
    }

    #[test]
    fn test_column_mismatch_reports_original_values() {
        let left = keyed(vec![row(1, "Alice")]);
        let right = keyed(vec![row(1, "Bob")]);
        let report = reconciler().reconcile(&left, &right);

        assert_eq!(report.mismatch_count(), 1);
        match report.iter().next().unwrap() {
            DiffEntry::ColumnMismatch {
                column,
                left,
                right,
                ..
            } => {
                assert_eq!(column, "NAME");
                assert_eq!(left, &ColumnValue::text("Alice"));
                assert_eq!(right, &ColumnValue::text("Bob"));
            }
            other => panic!("Expected ColumnMismatch, got {other:?}"),
        };
    }

    #[test]
    fn test_strip_mode_ignores_whitespace_difference() {
        // Scenario A: "Alice" vs "Alice " with stripping on is not a diff.
        let left = keyed(vec![row(1, "Alice")]);
        let right = keyed(vec![row(1, "Alice ")]);

        let report = reconciler().reconcile(&left, &right);
        assert!(report.is_empty());

        let strict = reconciler().strip_mode(StripMode::Preserve);
        let report = strict.reconcile(&left, &right);
        assert_eq!(report.mismatch_count(), 1);
    }

    #[test]
    fn test_large_text_compares_against_inline_text() {
        let left = keyed(vec![Row::new()
            .with_column("ID", DeclaredType::Numeric, ColumnValue::integer(1))
            .with_column("BODY", DeclaredType::LargeText, ColumnValue::LargeText("x y".into()))]);
        let right = keyed(vec![Row::new()
            .with_column("ID", DeclaredType::Numeric, ColumnValue::integer(1))
            .with_column("BODY", DeclaredType::Text, ColumnValue::text("xy"))]);

        let report = reconciler().reconcile(&left, &right);
        assert!(report.is_empty());
    }

    #[test]
    fn test_null_equals_null() {
        let null_row = |id: i64| {
            Row::new()
                .with_column("ID", DeclaredType::Numeric, ColumnValue::integer(id))
                .with_column("NAME", DeclaredType::Text, ColumnValue::Null)
        };
        let left = keyed(vec![null_row(1)]);
        let right = keyed(vec![null_row(1)]);
        assert!(reconciler().reconcile(&left, &right).is_empty());
    }

    #[test]
    fn test_column_absent_on_right_compares_as_null() {
        let left = keyed(vec![row(1, "a")]);
        let right = keyed(vec![Row::new().with_column(
            "ID",
            DeclaredType::Numeric,
            ColumnValue::integer(1),
        )]);

        let report = reconciler().reconcile(&left, &right);
        assert_eq!(report.mismatch_count(), 1);
        match report.iter().next().unwrap() {
            DiffEntry::ColumnMismatch { right, .. } => assert_eq!(right, &ColumnValue::Null),
            other => panic!("Expected ColumnMismatch, got {other:?}"),
        };
    }

    #[test]
    fn test_mismatches_follow_left_insertion_order() {
        let left = keyed(vec![row(3, "x"), row(1, "y"), row(2, "z")]);
        let right = keyed(vec![row(1, "y2"), row(2, "z2"), row(3, "x2")]);
        let report = reconciler().reconcile(&left, &right);

        let keys: Vec<String> = report
            .iter()
            .map(|e| match e {
                DiffEntry::ColumnMismatch { key, .. } => key.to_string(),
                other => panic!("Expected ColumnMismatch, got {other:?}"),
            })
            .collect();
        assert_eq!(keys, vec!["(3)", "(1)", "(2)"]);
    }
}
