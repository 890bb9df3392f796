//! Snapshot reconciliation for rowsync.
//!
//! This crate compares two keyed snapshots of the same table and produces a
//! classified diff:
//!
//! - rows present on the left but not the right
//! - rows present on the right but not the left
//! - per-column value mismatches for rows present on both sides
//!
//! Comparison always runs on normalized values (see
//! `rowsync_core::normalize`); the report carries the original values so a
//! reader sees exactly what each source returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use rowsync_core::prelude::*;
//! use rowsync_reconcile::Reconciler;
//!
//! let reconciler = Reconciler::new(vec!["ID".into()]);
//! let left = reconciler.index(left_rows)?;
//! let right = reconciler.index(right_rows)?;
//! let report = reconciler.reconcile(&left, &right);
//! for entry in report.iter() {
//!     println!("{entry:?}");
//! }
//! ```

pub mod engine;
pub mod report;

pub use engine::{DiffEntry, DiffReport, Reconciler};
pub use report::{write_csv, ReportError};
