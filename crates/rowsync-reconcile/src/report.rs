//! Tabular diff report writer.
//!
//! Serializes a [`DiffReport`] to CSV with one record per diff entry:
//! `kind,key,column,left,right`. Only DIFF records carry a column name and
//! values; missing-row records leave those cells empty.

use std::io;

use crate::engine::{DiffEntry, DiffReport};

/// Errors raised while writing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Flushing the underlying writer failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Writes `report` as CSV to `out`.
///
/// DIFF rows carry the original fetched values, not the normalized
/// comparison forms; NULL renders as an empty cell.
pub fn write_csv<W: io::Write>(report: &DiffReport, out: W) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["kind", "key", "column", "left", "right"])?;

    for entry in report.iter() {
        let record: [String; 5] = match entry {
            DiffEntry::ColumnMismatch {
                key,
                column,
                left,
                right,
            } => [
                "DIFF".to_string(),
                key.to_string(),
                column.clone(),
                left.to_string(),
                right.to_string(),
            ],
            DiffEntry::RowMissingInRight { key } => [
                "MISSING_IN_RIGHT".to_string(),
                key.to_string(),
                String::new(),
                String::new(),
                String::new(),
            ],
            DiffEntry::RowMissingInLeft { key } => [
                "MISSING_IN_LEFT".to_string(),
                key.to_string(),
                String::new(),
                String::new(),
                String::new(),
            ],
        };
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
