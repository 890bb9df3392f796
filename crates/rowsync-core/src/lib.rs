//! Core value model for rowsync.
//!
//! `rowsync-core` defines the pieces every other rowsync crate builds on:
//!
//! - **Column values** - a tagged union over the scalar shapes a relational
//!   source can hand back (`ColumnValue`), plus the declared column types
//!   that drive serialization (`DeclaredType`)
//! - **Normalization** - canonicalizing values for comparison, including
//!   whitespace stripping and large-object materialization
//! - **Rows and keys** - ordered rows, key tuples built from declared key
//!   columns, and the insertion-ordered `KeyedRowMap` index
//! - **Sources** - the async [`SourceFetcher`] seam the reconciliation and
//!   synthesis engines fetch rows through, with an in-memory implementation
//!   for tests and fixtures
//!
//! The crate is intentionally free of any database driver; concrete fetchers
//! live in sibling crates (e.g. `rowsync-sqlite`).
//!
//! [`SourceFetcher`]: source::SourceFetcher

pub mod key;
pub mod normalize;
pub mod row;
pub mod source;
pub mod value;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::key::{build_key, index_rows, KeyError, KeyPart, KeyTuple, KeyedRowMap};
    pub use crate::normalize::{materialize_large, normalize, StripMode};
    pub use crate::row::{Column, Row};
    pub use crate::source::{FetchError, MemoryFetcher, SourceConfig, SourceFetcher};
    pub use crate::value::{ColumnValue, DeclaredType, Temporal};
}
