//! Ordered rows of named, typed column values.

use crate::value::{ColumnValue, DeclaredType};

/// One column of a fetched row: name, declared type, and value.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name, uppercase-normalized.
    pub name: String,
    /// Type as declared by the source.
    pub declared: DeclaredType,
    /// The fetched value.
    pub value: ColumnValue,
}

/// An ordered mapping from column name to value.
///
/// Column names are case-normalized to uppercase on insertion and are unique
/// within a row; inserting an existing name replaces its value in place, so
/// column order is stable. All rows from one fetch share the same column
/// order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<Column>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column, replacing any existing column with the same name.
    #[must_use]
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        declared: DeclaredType,
        value: ColumnValue,
    ) -> Self {
        self.insert(name, declared, value);
        self
    }

    /// Adds a column in place, replacing any existing column with the same
    /// name.
    pub fn insert(&mut self, name: impl Into<String>, declared: DeclaredType, value: ColumnValue) {
        let name = name.into().to_uppercase();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => {
                existing.declared = declared;
                existing.value = value;
            }
            None => self.columns.push(Column {
                name,
                declared,
                value,
            }),
        }
    }

    /// Looks up a column by name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Column> {
        let name = name.to_uppercase();
        self.columns.iter().find(|c| c.name == name)
    }

    /// The columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
