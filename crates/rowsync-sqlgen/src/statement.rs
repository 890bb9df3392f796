//! The DML statement model and transactional block.
//!
//! Statements are built as data and rendered to SQL text in one place, so
//! the emitted format is auditable without chasing string concatenation
//! through the engine.

use serde::Serialize;

use crate::literal;

/// One statement inside a generated block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DmlStatement {
    /// Assignment of escaped text into a scratch CLOB variable.
    ///
    /// Must appear before the statement consuming the variable; `text` is
    /// stored raw and escaped at render time.
    AssignScratch {
        /// Scratch variable name.
        var: String,
        /// Raw (unescaped) text value.
        text: String,
    },

    /// Delete every row matching the key predicate.
    Delete {
        /// Target table.
        table: String,
        /// Rendered key predicate.
        predicate: String,
    },

    /// Insert one row with pre-rendered value expressions.
    Insert {
        /// Target table.
        table: String,
        /// Column names in insertion order.
        columns: Vec<String>,
        /// Value expressions, parallel to `columns`.
        values: Vec<String>,
    },

    /// Update a single column, guarded by the key predicate.
    Update {
        /// Target table.
        table: String,
        /// Column to set.
        column: String,
        /// Pre-rendered value expression.
        expr: String,
        /// Rendered key predicate.
        predicate: String,
    },
}

impl DmlStatement {
    /// Renders this statement as one line of SQL (trailing semicolon
    /// included).
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::AssignScratch { var, text } => {
                format!("{var} := {};", literal::quote(text))
            }
            Self::Delete { table, predicate } => {
                format!("DELETE FROM {table} WHERE {predicate};")
            }
            Self::Insert {
                table,
                columns,
                values,
            } => format!(
                "INSERT INTO {table} ({}) VALUES ({});",
                columns.join(", "),
                values.join(", ")
            ),
            Self::Update {
                table,
                column,
                expr,
                predicate,
            } => format!("UPDATE {table} SET {column} = {expr} WHERE {predicate};"),
        }
    }
}

/// A transactional block of statements for one table group.
///
/// Renders as a DECLARE section for the scratch variables, a BEGIN/END body
/// with one statement group per processed row specification, a single COMMIT
/// before END, and the `/` batch terminator. A failed open statement leaves
/// the transaction uncommitted; there is no partial commit mid-block.
#[derive(Debug, Default, Serialize)]
pub struct SqlBlock {
    declarations: Vec<String>,
    groups: Vec<Vec<DmlStatement>>,
}

impl SqlBlock {
    /// Creates a block declaring the given scratch variables.
    #[must_use]
    pub fn new(scratch_vars: &[String]) -> Self {
        Self {
            declarations: scratch_vars.to_vec(),
            groups: Vec::new(),
        }
    }

    /// Appends the statements emitted for one row specification.
    pub fn push_group(&mut self, statements: Vec<DmlStatement>) {
        if !statements.is_empty() {
            self.groups.push(statements);
        }
    }

    /// All statements in emission order.
    pub fn statements(&self) -> impl Iterator<Item = &DmlStatement> {
        self.groups.iter().flatten()
    }

    /// Total number of statements.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Returns true when no specification produced statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Renders the complete block.
    #[must_use]
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        lines.push("DECLARE".to_string());
        for var in &self.declarations {
            lines.push(format!("    {var} CLOB;"));
        }
        lines.push("BEGIN".to_string());
        for group in &self.groups {
            for statement in group {
                lines.push(format!("    {}", statement.to_sql()));
            }
            lines.push(String::new());
        }
        lines.push("    COMMIT;".to_string());
        lines.push("END;".to_string());
        lines.push("/".to_string());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_scratch_escapes_at_render() {
        let stmt = DmlStatement::AssignScratch {
            var: "v_clob1".into(),
            text: "it's long".into(),
        };
        assert_eq!(stmt.to_sql(), "v_clob1 := 'it''s long';");
    }

    #[test]
    fn test_delete_sql() {
        let stmt = DmlStatement::Delete {
            table: "SCRIPTS".into(),
            predicate: "ID = '5'".into(),
        };
        assert_eq!(stmt.to_sql(), "DELETE FROM SCRIPTS WHERE ID = '5';");
    }

    #[test]
    fn test_insert_sql() {
        let stmt = DmlStatement::Insert {
            table: "SCRIPTS".into(),
            columns: vec!["ID".into(), "NAME".into()],
            values: vec!["5".into(), "'x'".into()],
        };
        assert_eq!(
            stmt.to_sql(),
            "INSERT INTO SCRIPTS (ID, NAME) VALUES (5, 'x');"
        );
    }

    #[test]
    fn test_update_sql() {
        let stmt = DmlStatement::Update {
            table: "SCRIPTS".into(),
            column: "STATUS".into(),
            expr: "'OLD'".into(),
            predicate: "ID = '5'".into(),
        };
        assert_eq!(
            stmt.to_sql(),
            "UPDATE SCRIPTS SET STATUS = 'OLD' WHERE ID = '5';"
        );
    }

    #[test]
    fn test_block_render_frame() {
        let vars = vec!["v_clob1".to_string(), "v_clob2".to_string()];
        let mut block = SqlBlock::new(&vars);
        block.push_group(vec![DmlStatement::Delete {
            table: "T".into(),
            predicate: "ID = '1'".into(),
        }]);

        let sql = block.render();
        let expected = "\
DECLARE
    v_clob1 CLOB;
    v_clob2 CLOB;
BEGIN
    DELETE FROM T WHERE ID = '1';

    COMMIT;
END;
/";
        assert_eq!(sql, expected);
    }

    #[test]
    fn test_empty_group_is_dropped() {
        let mut block = SqlBlock::new(&["v_clob1".to_string()]);
        block.push_group(Vec::new());
        assert!(block.is_empty());
        assert_eq!(block.statement_count(), 0);
    }

    #[test]
    fn test_groups_are_blank_line_separated() {
        let mut block = SqlBlock::new(&["v_clob1".to_string()]);
        for id in ["1", "2"] {
            block.push_group(vec![DmlStatement::Delete {
                table: "T".into(),
                predicate: format!("ID = '{id}'"),
            }]);
        }
        let sql = block.render();
        assert!(sql.contains("ID = '1';\n\n    DELETE"));
        assert_eq!(block.statement_count(), 2);
    }
}
