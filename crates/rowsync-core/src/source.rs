//! The source fetcher seam.
//!
//! Engines never talk to a database directly; they fetch rows through
//! [`SourceFetcher`]. Concrete implementations own their connection
//! lifecycle and are constructed from an explicit [`SourceConfig`] (no
//! process-wide connection state). Retry on transient connectivity failure
//! is the caller's responsibility; fetchers surface errors as-is.

use std::collections::HashMap;

use crate::normalize::{normalize, StripMode};
use crate::row::Row;

/// Connection configuration for a source fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Connection URL or path understood by the fetcher implementation.
    pub url: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl SourceConfig {
    /// Creates a configuration with the default pool size.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
        }
    }

    /// Sets the maximum pooled connections.
    #[must_use]
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Errors surfaced by source fetchers.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The source cannot be reached or the query failed.
    ///
    /// Fatal for the batch: callers surface this instead of continuing.
    #[error("source unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// The requested table is not known to the source.
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    /// A requested column is absent from the table.
    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn {
        /// Table that was queried.
        table: String,
        /// Column that was requested.
        column: String,
    },
}

impl FetchError {
    /// Wraps an underlying driver error as [`FetchError::Unavailable`].
    #[must_use]
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Box::new(err))
    }
}

/// Asynchronous row source.
///
/// `fetch_where` filters by equality on the given key bindings (bound
/// server-side by real implementations, never interpolated) and optionally
/// projects to the named columns, in the requested order. Fetching is the
/// only suspension point in the engines built on top of this trait.
#[allow(async_fn_in_trait)]
pub trait SourceFetcher {
    /// Fetches every row of `table` with all columns.
    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>, FetchError>;

    /// Fetches rows of `table` matching all `key` bindings.
    ///
    /// With `columns = None` all columns are returned; otherwise only the
    /// named columns, in the given order.
    async fn fetch_where(
        &self,
        table: &str,
        columns: Option<&[String]>,
        key: &[(String, String)],
    ) -> Result<Vec<Row>, FetchError>;
}

/// In-memory [`SourceFetcher`] for tests and fixtures.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    tables: HashMap<String, Vec<Row>>,
}

impl MemoryFetcher {
    /// Creates an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table with its rows.
    #[must_use]
    pub fn table(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.tables.insert(name.into().to_uppercase(), rows);
        self
    }

    fn rows(&self, table: &str) -> Result<&[Row], FetchError> {
        self.tables
            .get(&table.to_uppercase())
            .map(Vec::as_slice)
            .ok_or_else(|| FetchError::UnknownTable(table.to_string()))
    }

    fn matches(row: &Row, key: &[(String, String)]) -> bool {
        key.iter().all(|(name, wanted)| {
            row.get(name)
                .and_then(|c| normalize(&c.value, StripMode::Preserve).canonical_text())
                .is_some_and(|text| text == *wanted)
        })
    }

    fn project(row: &Row, table: &str, columns: &[String]) -> Result<Row, FetchError> {
        let mut projected = Row::new();
        for name in columns {
            let column = row.get(name).ok_or_else(|| FetchError::UnknownColumn {
                table: table.to_string(),
                column: name.clone(),
            })?;
            projected.insert(&column.name, column.declared, column.value.clone());
        }
        Ok(projected)
    }
}

impl SourceFetcher for MemoryFetcher {
    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>, FetchError> {
        Ok(self.rows(table)?.to_vec())
    }

    async fn fetch_where(
        &self,
        table: &str,
        columns: Option<&[String]>,
        key: &[(String, String)],
    ) -> Result<Vec<Row>, FetchError> {
        let mut out = Vec::new();
        for row in self.rows(table)? {
            if !Self::matches(row, key) {
                continue;
            }
            match columns {
                Some(cols) => out.push(Self::project(row, table, cols)?),
                None => out.push(row.clone()),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ColumnValue, DeclaredType};

    fn row(id: i64, status: &str) -> Row {
        Row::new()
            .with_column("ID", DeclaredType::Numeric, ColumnValue::integer(id))
            .with_column("STATUS", DeclaredType::Text, ColumnValue::text(status))
    }

    fn fetcher() -> MemoryFetcher {
        MemoryFetcher::new().table("SCRIPTS", vec![row(1, "OLD"), row(2, "NEW")])
    }

    #[tokio::test]
    async fn test_fetch_all() {
        let rows = fetcher().fetch_all("scripts").await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_all_unknown_table() {
        let err = fetcher().fetch_all("nope").await.unwrap_err();
        assert!(matches!(err, FetchError::UnknownTable(t) if t == "nope"));
    }

    #[tokio::test]
    async fn test_fetch_where_matches_key() {
        let rows = fetcher()
            .fetch_where("SCRIPTS", None, &[("ID".into(), "2".into())])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("STATUS").unwrap().value,
            ColumnValue::text("NEW")
        );
    }

    #[tokio::test]
    async fn test_fetch_where_no_match() {
        let rows = fetcher()
            .fetch_where("SCRIPTS", None, &[("ID".into(), "5".into())])
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_where_projects_columns() {
        let cols = vec!["STATUS".to_string()];
        let rows = fetcher()
            .fetch_where("SCRIPTS", Some(cols.as_slice()), &[("ID".into(), "1".into())])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(
            rows[0].get("STATUS").unwrap().value,
            ColumnValue::text("OLD")
        );
    }

    #[tokio::test]
    async fn test_fetch_where_unknown_column() {
        let cols = vec!["ABSENT".to_string()];
        let err = fetcher()
            .fetch_where("SCRIPTS", Some(cols.as_slice()), &[("ID".into(), "1".into())])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnknownColumn { .. }));
    }
}
