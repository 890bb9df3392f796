//! Row specifications and the text input format.
//!
//! The input format is line-oriented:
//!
//! ```text
//! SCWEB_SCRIPTS
//! ID=5
//! ID=6, STATUS, UPDATED_AT
//!
//! SCWEB_USERS
//! ID=1, PRIVILEGE_ID=2
//! ```
//!
//! A line containing neither `=` nor `,` starts a new table group; every
//! other non-blank line is a row specification made of comma-separated
//! parts, where `key=value` parts are key bindings and bare parts are field
//! names to update. A specification with no field names means "replace the
//! whole row".

use serde::Serialize;

/// Caller intent for one logical row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSpec {
    /// 1-based input line this specification came from.
    pub line: usize,
    /// Ordered key bindings; used both to locate the source row and to
    /// build the key predicate.
    pub key: Vec<(String, String)>,
    /// Fields to update individually; empty means replace the whole row.
    pub fields: Vec<String>,
}

impl RowSpec {
    /// Creates a specification with key bindings only (whole-row replace).
    #[must_use]
    pub fn whole_row(key: Vec<(String, String)>) -> Self {
        Self {
            line: 0,
            key,
            fields: Vec::new(),
        }
    }

    /// Creates a specification updating the named fields.
    #[must_use]
    pub fn fields(key: Vec<(String, String)>, fields: Vec<String>) -> Self {
        Self {
            line: 0,
            key,
            fields,
        }
    }
}

/// One named table group and its specifications, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecGroup {
    /// Target table name.
    pub table: String,
    /// Row specifications, in input order.
    pub specs: Vec<RowSpec>,
}

/// Errors raised while parsing specification text.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SpecParseError {
    /// A data line appeared before any table header.
    ///
    /// Swallowing such a line would silently drop a statement downstream,
    /// so it is an error rather than a warning.
    #[error("line {line}: data line appears before any table header")]
    LineOutsideGroup {
        /// 1-based input line number.
        line: usize,
    },
}

/// Parses specification text into table groups.
///
/// Blank lines are skipped. Specifications with no key bindings are kept;
/// the synthesis engine reports them as diagnostics so the line number
/// reaches the operator.
pub fn parse_spec_text(text: &str) -> Result<Vec<SpecGroup>, SpecParseError> {
    let mut groups: Vec<SpecGroup> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if !line.contains('=') && !line.contains(',') {
            groups.push(SpecGroup {
                table: line.to_string(),
                specs: Vec::new(),
            });
            continue;
        }

        let Some(group) = groups.last_mut() else {
            return Err(SpecParseError::LineOutsideGroup { line: line_no });
        };

        let mut key = Vec::new();
        let mut fields = Vec::new();
        for part in line.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match part.split_once('=') {
                Some((name, value)) => {
                    key.push((name.trim().to_string(), value.trim().to_string()));
                }
                None => fields.push(part.to_string()),
            }
        }
        group.specs.push(RowSpec {
            line: line_no,
            key,
            fields,
        });
    }

    Ok(groups)
}
