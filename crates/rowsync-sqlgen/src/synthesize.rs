//! The DML synthesis engine.
//!
//! Walks one table group's row specifications in input order, fetches the
//! current source values for each, and emits a transactional [`SqlBlock`].
//! A specification that cannot be resolved safely (no match, ambiguous
//! match, no key bindings) is skipped with a [`Diagnostic`]; only a source
//! fetch failure aborts the group.

use std::fmt;

use tracing::{info, warn};

use rowsync_core::row::Row;
use rowsync_core::source::{FetchError, SourceFetcher};

use crate::literal;
use crate::scratch::{ScratchPool, DEFAULT_POOL_SIZE};
use crate::serialize::serialize_value;
use crate::spec::{RowSpec, SpecGroup};
use crate::statement::{DmlStatement, SqlBlock};

/// A per-specification condition that skipped the specification.
///
/// Diagnostics never abort the batch; they are collected and returned next
/// to the emitted statements. Each one names the table and key values so an
/// operator can act on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The specification carried no key bindings.
    EmptyKey {
        /// Target table.
        table: String,
        /// 1-based input line of the specification.
        line: usize,
    },
    /// No source row matches the key.
    NotFound {
        /// Target table.
        table: String,
        /// The key bindings that matched nothing.
        key: Vec<(String, String)>,
    },
    /// More than one source row matches the key.
    ///
    /// An ambiguous key never produces a destructive statement.
    AmbiguousKey {
        /// Target table.
        table: String,
        /// The ambiguous key bindings.
        key: Vec<(String, String)>,
        /// How many rows matched.
        matches: usize,
    },
}

fn format_key(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey { table, line } => {
                write!(f, "table {table}, line {line}: specification has no key bindings")
            }
            Self::NotFound { table, key } => {
                write!(f, "table {table}: no row matches key ({})", format_key(key))
            }
            Self::AmbiguousKey {
                table,
                key,
                matches,
            } => write!(
                f,
                "table {table}: {matches} rows match key ({}), skipping",
                format_key(key)
            ),
        }
    }
}

/// Errors that abort a whole table group.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// The source could not be fetched from. Not retried here; retry policy
    /// belongs to the caller.
    #[error("source fetch failed: {0}")]
    Source(#[from] FetchError),
}

/// The result of synthesizing one table group.
#[derive(Debug)]
pub struct GroupOutput {
    /// Target table.
    pub table: String,
    /// The transactional block (possibly with zero statements).
    pub block: SqlBlock,
    /// Per-specification diagnostics, in input order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Synthesizes DML blocks from row specifications.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    pool_size: usize,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synthesizer {
    /// Creates a synthesizer with the default scratch pool size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    /// Overrides the scratch pool size for generated blocks.
    #[must_use]
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Processes one table group, specification by specification.
    ///
    /// Every specification is fully processed or fully skipped; the scratch
    /// cursor resets at each one, so cancellation between specifications is
    /// always safe.
    pub async fn synthesize_group<F: SourceFetcher>(
        &self,
        fetcher: &F,
        group: &SpecGroup,
    ) -> Result<GroupOutput, SynthesisError> {
        let mut pool = ScratchPool::with_size(self.pool_size);
        let mut block = SqlBlock::new(pool.names());
        let mut diagnostics = Vec::new();

        for spec in &group.specs {
            pool.reset();

            if spec.key.is_empty() {
                let diag = Diagnostic::EmptyKey {
                    table: group.table.clone(),
                    line: spec.line,
                };
                warn!(%diag, "skipping specification");
                diagnostics.push(diag);
                continue;
            }

            let statements = if spec.fields.is_empty() {
                self.replace_row(fetcher, &group.table, spec, &mut pool, &mut diagnostics)
                    .await?
            } else {
                self.update_fields(fetcher, &group.table, spec, &mut pool, &mut diagnostics)
                    .await?
            };
            block.push_group(statements);
        }

        info!(
            table = %group.table,
            specs = group.specs.len(),
            statements = block.statement_count(),
            diagnostics = diagnostics.len(),
            "synthesized table group"
        );

        Ok(GroupOutput {
            table: group.table.clone(),
            block,
            diagnostics,
        })
    }

    /// Fetches the single row a specification addresses, or records a
    /// diagnostic and returns `None` for the zero and many cases.
    async fn fetch_one<F: SourceFetcher>(
        fetcher: &F,
        table: &str,
        columns: Option<&[String]>,
        spec: &RowSpec,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Option<Row>, SynthesisError> {
        let rows = fetcher.fetch_where(table, columns, &spec.key).await?;
        match rows.len() {
            1 => Ok(rows.into_iter().next()),
            0 => {
                let diag = Diagnostic::NotFound {
                    table: table.to_string(),
                    key: spec.key.clone(),
                };
                warn!(%diag, "skipping specification");
                diagnostics.push(diag);
                Ok(None)
            }
            matches => {
                let diag = Diagnostic::AmbiguousKey {
                    table: table.to_string(),
                    key: spec.key.clone(),
                    matches,
                };
                warn!(%diag, "skipping specification");
                diagnostics.push(diag);
                Ok(None)
            }
        }
    }

    /// Whole-row replace: scratch assignments, then DELETE, then a full
    /// INSERT of every fetched column.
    async fn replace_row<F: SourceFetcher>(
        &self,
        fetcher: &F,
        table: &str,
        spec: &RowSpec,
        pool: &mut ScratchPool,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<DmlStatement>, SynthesisError> {
        let Some(row) = Self::fetch_one(fetcher, table, None, spec, diagnostics).await? else {
            return Ok(Vec::new());
        };

        let predicate = literal::key_predicate(&spec.key);
        let mut statements = Vec::new();
        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());

        for column in row.columns() {
            let serialized = serialize_value(&column.value, column.declared, pool);
            statements.extend(serialized.assignments);
            columns.push(column.name.clone());
            values.push(serialized.expr);
        }

        statements.push(DmlStatement::Delete {
            table: table.to_string(),
            predicate: predicate.clone(),
        });
        statements.push(DmlStatement::Insert {
            table: table.to_string(),
            columns,
            values,
        });
        Ok(statements)
    }

    /// Field update: one UPDATE per named field, each preceded by any
    /// scratch assignment its value needs.
    async fn update_fields<F: SourceFetcher>(
        &self,
        fetcher: &F,
        table: &str,
        spec: &RowSpec,
        pool: &mut ScratchPool,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<DmlStatement>, SynthesisError> {
        let Some(row) =
            Self::fetch_one(fetcher, table, Some(spec.fields.as_slice()), spec, diagnostics)
                .await?
        else {
            return Ok(Vec::new());
        };

        let predicate = literal::key_predicate(&spec.key);
        let mut statements = Vec::new();

        for field in &spec.fields {
            // The projected fetch guarantees the column is present.
            let Some(column) = row.get(field) else {
                continue;
            };
            let serialized = serialize_value(&column.value, column.declared, pool);
            statements.extend(serialized.assignments);
            statements.push(DmlStatement::Update {
                table: table.to_string(),
                column: field.clone(),
                expr: serialized.expr,
                predicate: predicate.clone(),
            });
        }
        Ok(statements)
    }
}
