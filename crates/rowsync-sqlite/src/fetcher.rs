//! The sqlx-backed fetcher implementation.

use std::collections::HashMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use tracing::debug;

use rowsync_core::normalize::materialize_large;
use rowsync_core::row::Row;
use rowsync_core::source::{FetchError, SourceConfig, SourceFetcher};
use rowsync_core::value::{ColumnValue, DeclaredType, Temporal};

/// Maps a declared column type string to a [`DeclaredType`].
///
/// Matching is substring-based on the uppercased declaration, the same way
/// the generated scripts' consumers classify columns: any `LOB` type is
/// large text, date-time declarations win over plain dates, and numeric
/// affinities collapse into one numeric kind.
#[must_use]
pub fn declared_from_decl(decl: &str) -> DeclaredType {
    let decl = decl.to_uppercase();
    if decl.contains("LOB") {
        DeclaredType::LargeText
    } else if decl.contains("DATETIME") || decl.contains("TIMESTAMP") {
        DeclaredType::DateTime
    } else if decl.contains("DATE") {
        DeclaredType::Date
    } else if decl.contains("INT")
        || decl.contains("NUM")
        || decl.contains("DEC")
        || decl.contains("REAL")
        || decl.contains("DOUB")
        || decl.contains("FLOA")
    {
        DeclaredType::Numeric
    } else {
        DeclaredType::Text
    }
}

/// A [`SourceFetcher`] backed by an SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteFetcher {
    pool: SqlitePool,
}

impl SqliteFetcher {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects using an explicit configuration.
    pub async fn connect(config: &SourceConfig) -> Result<Self, FetchError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(FetchError::unavailable)?;
        Ok(Self { pool })
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Reads declared column types for `table` from `PRAGMA table_info`.
    async fn column_types(&self, table: &str) -> Result<HashMap<String, DeclaredType>, FetchError> {
        let sql = format!("PRAGMA table_info(\"{table}\")");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(FetchError::unavailable)?;

        if rows.is_empty() {
            return Err(FetchError::UnknownTable(table.to_string()));
        }

        let mut types = HashMap::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name").map_err(FetchError::unavailable)?;
            let decl: String = row.try_get("type").map_err(FetchError::unavailable)?;
            types.insert(name.to_uppercase(), declared_from_decl(&decl));
        }
        Ok(types)
    }

    fn convert_rows(
        rows: Vec<SqliteRow>,
        types: &HashMap<String, DeclaredType>,
    ) -> Result<Vec<Row>, FetchError> {
        rows.iter().map(|row| Self::convert_row(row, types)).collect()
    }

    fn convert_row(
        row: &SqliteRow,
        types: &HashMap<String, DeclaredType>,
    ) -> Result<Row, FetchError> {
        let mut out = Row::new();
        for (idx, column) in row.columns().iter().enumerate() {
            let name = column.name().to_uppercase();
            let declared = types.get(&name).copied().unwrap_or(DeclaredType::Text);
            let value = Self::decode_value(row, idx, declared)?;
            out.insert(&name, declared, value);
        }
        Ok(out)
    }

    /// Decodes one cell, driven by the declared type with the stored value's
    /// affinity as a tiebreaker (SQLite columns may hold any affinity).
    fn decode_value(
        row: &SqliteRow,
        idx: usize,
        declared: DeclaredType,
    ) -> Result<ColumnValue, FetchError> {
        let raw = row.try_get_raw(idx).map_err(FetchError::unavailable)?;
        if raw.is_null() {
            return Ok(ColumnValue::Null);
        }
        let stored = raw.type_info().name().to_string();

        let value = match declared {
            DeclaredType::LargeText => {
                if stored == "BLOB" {
                    let bytes: Vec<u8> = row.try_get(idx).map_err(FetchError::unavailable)?;
                    materialize_large(Ok(bytes))
                } else {
                    let text: String = row.try_get(idx).map_err(FetchError::unavailable)?;
                    ColumnValue::LargeText(text)
                }
            }
            DeclaredType::Numeric => match stored.as_str() {
                "INTEGER" => {
                    let n: i64 = row.try_get(idx).map_err(FetchError::unavailable)?;
                    ColumnValue::Numeric(BigDecimal::from(n))
                }
                "REAL" => {
                    let f: f64 = row.try_get(idx).map_err(FetchError::unavailable)?;
                    match BigDecimal::from_str(&f.to_string()) {
                        Ok(d) => ColumnValue::Numeric(d),
                        Err(_) => ColumnValue::Text(f.to_string()),
                    }
                }
                _ => {
                    let text: String = row.try_get(idx).map_err(FetchError::unavailable)?;
                    match BigDecimal::from_str(text.trim()) {
                        Ok(d) => ColumnValue::Numeric(d),
                        Err(_) => ColumnValue::Text(text),
                    }
                }
            },
            DeclaredType::Date => match row.try_get::<NaiveDate, _>(idx) {
                Ok(d) => ColumnValue::Temporal(Temporal::Date(d)),
                Err(_) => Self::decode_text(row, idx)?,
            },
            DeclaredType::DateTime => match row.try_get::<NaiveDateTime, _>(idx) {
                Ok(dt) => ColumnValue::Temporal(Temporal::DateTime(dt)),
                Err(_) => Self::decode_text(row, idx)?,
            },
            DeclaredType::Text => match stored.as_str() {
                "INTEGER" => {
                    let n: i64 = row.try_get(idx).map_err(FetchError::unavailable)?;
                    ColumnValue::Text(n.to_string())
                }
                "REAL" => {
                    let f: f64 = row.try_get(idx).map_err(FetchError::unavailable)?;
                    ColumnValue::Text(f.to_string())
                }
                "BLOB" => {
                    let bytes: Vec<u8> = row.try_get(idx).map_err(FetchError::unavailable)?;
                    ColumnValue::Text(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => {
                    let text: String = row.try_get(idx).map_err(FetchError::unavailable)?;
                    ColumnValue::Text(text)
                }
            },
        };
        Ok(value)
    }

    fn decode_text(row: &SqliteRow, idx: usize) -> Result<ColumnValue, FetchError> {
        let text: String = row.try_get(idx).map_err(FetchError::unavailable)?;
        Ok(ColumnValue::Text(text))
    }

    fn map_query_error(table: &str, err: sqlx::Error) -> FetchError {
        // sqlx surfaces a missing table as a database-level error; translate
        // the common case so callers get the typed variant.
        if err.to_string().contains("no such table") {
            FetchError::UnknownTable(table.to_string())
        } else {
            FetchError::unavailable(err)
        }
    }
}

impl SourceFetcher for SqliteFetcher {
    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>, FetchError> {
        let types = self.column_types(table).await?;
        let sql = format!("SELECT * FROM \"{table}\"");
        debug!(sql = %sql, "fetching all rows");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::map_query_error(table, e))?;
        Self::convert_rows(rows, &types)
    }

    async fn fetch_where(
        &self,
        table: &str,
        columns: Option<&[String]>,
        key: &[(String, String)],
    ) -> Result<Vec<Row>, FetchError> {
        let types = self.column_types(table).await?;

        if let Some(cols) = columns {
            for col in cols {
                if !types.contains_key(&col.to_uppercase()) {
                    return Err(FetchError::UnknownColumn {
                        table: table.to_string(),
                        column: col.clone(),
                    });
                }
            }
        }

        let select = match columns {
            Some(cols) => cols
                .iter()
                .map(|c| format!("\"{c}\""))
                .collect::<Vec<_>>()
                .join(", "),
            None => "*".to_string(),
        };
        let predicate = key
            .iter()
            .map(|(column, _)| format!("\"{column}\" = ?"))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!("SELECT {select} FROM \"{table}\" WHERE {predicate}");
        debug!(sql = %sql, "fetching rows by key");

        let mut query = sqlx::query(&sql);
        for (_, value) in key {
            query = query.bind(value.as_str());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::map_query_error(table, e))?;
        Self::convert_rows(rows, &types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_fetcher() -> SqliteFetcher {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool");

        sqlx::query(
            "CREATE TABLE scripts (
                id INTEGER,
                status TEXT,
                body CLOB,
                amount NUMERIC,
                created_at DATETIME
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO scripts VALUES
                (1, 'OLD', 'select 1', 10.50, '2024-03-09 13:05:59'),
                (2, 'NEW', NULL, 7, '2024-03-10 08:00:00')",
        )
        .execute(&pool)
        .await
        .unwrap();

        SqliteFetcher::new(pool)
    }

    #[test]
    fn test_declared_from_decl_mapping() {
        assert_eq!(declared_from_decl("CLOB"), DeclaredType::LargeText);
        assert_eq!(declared_from_decl("blob"), DeclaredType::LargeText);
        assert_eq!(declared_from_decl("DATETIME"), DeclaredType::DateTime);
        assert_eq!(declared_from_decl("TIMESTAMP"), DeclaredType::DateTime);
        assert_eq!(declared_from_decl("DATE"), DeclaredType::Date);
        assert_eq!(declared_from_decl("NUMBER(10,2)"), DeclaredType::Numeric);
        assert_eq!(declared_from_decl("INTEGER"), DeclaredType::Numeric);
        assert_eq!(declared_from_decl("VARCHAR(255)"), DeclaredType::Text);
    }

    #[tokio::test]
    async fn test_fetch_all_decodes_declared_types() {
        let fetcher = test_fetcher().await;
        let rows = fetcher.fetch_all("scripts").await.unwrap();
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.get("ID").unwrap().value, ColumnValue::integer(1));
        assert_eq!(first.get("ID").unwrap().declared, DeclaredType::Numeric);
        assert_eq!(
            first.get("BODY").unwrap().value,
            ColumnValue::LargeText("select 1".into())
        );
        assert_eq!(first.get("BODY").unwrap().declared, DeclaredType::LargeText);
        assert_eq!(
            first.get("CREATED_AT").unwrap().value.canonical_text(),
            Some("2024-03-09 13:05:59".to_string())
        );

        let second = &rows[1];
        assert_eq!(second.get("BODY").unwrap().value, ColumnValue::Null);
    }

    #[tokio::test]
    async fn test_fetch_all_unknown_table() {
        let fetcher = test_fetcher().await;
        let err = fetcher.fetch_all("missing").await.unwrap_err();
        assert!(matches!(err, FetchError::UnknownTable(t) if t == "missing"));
    }

    #[tokio::test]
    async fn test_fetch_where_binds_key_values() {
        let fetcher = test_fetcher().await;
        let rows = fetcher
            .fetch_where("scripts", None, &[("id".into(), "2".into())])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("STATUS").unwrap().value,
            ColumnValue::Text("NEW".into())
        );
    }

    #[tokio::test]
    async fn test_fetch_where_projects_requested_columns() {
        let fetcher = test_fetcher().await;
        let cols = vec!["status".to_string()];
        let rows = fetcher
            .fetch_where("scripts", Some(cols.as_slice()), &[("id".into(), "1".into())])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(
            rows[0].get("STATUS").unwrap().value,
            ColumnValue::Text("OLD".into())
        );
    }

    #[tokio::test]
    async fn test_fetch_where_unknown_column() {
        let fetcher = test_fetcher().await;
        let cols = vec!["absent".to_string()];
        let err = fetcher
            .fetch_where("scripts", Some(cols.as_slice()), &[("id".into(), "1".into())])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnknownColumn { .. }));
    }

    #[tokio::test]
    async fn test_no_match_returns_empty() {
        let fetcher = test_fetcher().await;
        let rows = fetcher
            .fetch_where("scripts", None, &[("id".into(), "99".into())])
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
