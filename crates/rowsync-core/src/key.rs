//! Key tuples and the keyed row index.
//!
//! A key tuple is the identity of one logical row across snapshots: the
//! values of the declared key columns, in declared order, in canonical text
//! form. Two rows with equal key tuples are the same entity.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::normalize::{normalize, StripMode};
use crate::row::Row;

/// One component of a key tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyPart {
    /// The key column was NULL.
    Null,
    /// Canonical text of the key column's value.
    Value(String),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Value(s) => f.write_str(s),
        }
    }
}

/// Ordered key-column values identifying one logical row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyTuple(Vec<KeyPart>);

impl KeyTuple {
    /// Creates a key tuple from its parts.
    #[must_use]
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    /// The parts in key-column order.
    #[must_use]
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }
}

impl fmt::Display for KeyTuple {
    /// Renders as `(v1, v2)` for diagnostics and reports.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{part}")?;
        }
        f.write_str(")")
    }
}

/// Errors raised while building key tuples.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    /// A declared key column is absent from a row's column set.
    #[error("key column '{column}' is missing from the row")]
    MissingKeyColumn {
        /// The missing column name.
        column: String,
    },
    /// The declared key column list is empty.
    #[error("the key column list must not be empty")]
    EmptyKeyColumns,
}

/// Builds the key tuple for `row` from the declared key columns, in order.
///
/// Key parts use canonical text with whitespace preserved; stripping is a
/// comparison concern for non-key columns, not for identity.
pub fn build_key(row: &Row, key_columns: &[String]) -> Result<KeyTuple, KeyError> {
    if key_columns.is_empty() {
        return Err(KeyError::EmptyKeyColumns);
    }
    let mut parts = Vec::with_capacity(key_columns.len());
    for name in key_columns {
        let column = row.get(name).ok_or_else(|| KeyError::MissingKeyColumn {
            column: name.clone(),
        })?;
        let canonical = normalize(&column.value, StripMode::Preserve);
        parts.push(match canonical.canonical_text() {
            Some(text) => KeyPart::Value(text),
            None => KeyPart::Null,
        });
    }
    Ok(KeyTuple(parts))
}

/// Insertion-ordered index from [`KeyTuple`] to [`Row`] for one snapshot.
///
/// Iteration yields entries in first-insertion order, which is what makes
/// diff output deterministic. Duplicate keys within one snapshot follow
/// last-write-wins: the later row replaces the earlier one in place, and the
/// collision is counted and logged.
#[derive(Debug, Default)]
pub struct KeyedRowMap {
    entries: Vec<(KeyTuple, Row)>,
    index: HashMap<KeyTuple, usize>,
    duplicate_keys: usize,
}

impl KeyedRowMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row under its key. Returns true if the key was new.
    pub fn insert(&mut self, key: KeyTuple, row: Row) -> bool {
        match self.index.get(&key) {
            Some(&pos) => {
                warn!(key = %key, "duplicate key in snapshot, keeping the later row");
                self.entries[pos].1 = row;
                self.duplicate_keys += 1;
                false
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, row));
                true
            }
        }
    }

    /// Looks up the row for a key.
    #[must_use]
    pub fn get(&self, key: &KeyTuple) -> Option<&Row> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// Returns true when the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &KeyTuple) -> bool {
        self.index.contains_key(key)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&KeyTuple, &Row)> {
        self.entries.iter().map(|(k, r)| (k, r))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &KeyTuple> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the map holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of duplicate-key collisions seen while building the map.
    #[must_use]
    pub fn duplicate_keys(&self) -> usize {
        self.duplicate_keys
    }
}

/// Indexes a sequence of rows by the declared key columns.
///
/// Fails fast on a row missing a key column; duplicate keys are handled by
/// [`KeyedRowMap::insert`] (last-write-wins).
pub fn index_rows(rows: Vec<Row>, key_columns: &[String]) -> Result<KeyedRowMap, KeyError> {
    let mut map = KeyedRowMap::new();
    for row in rows {
        let key = build_key(&row, key_columns)?;
        map.insert(key, row);
    }
    Ok(map)
}
