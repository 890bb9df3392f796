//! SQLite source fetcher for rowsync.
//!
//! [`SqliteFetcher`] implements `rowsync_core::source::SourceFetcher` over an
//! `sqlx` connection pool. Declared column types come from
//! `PRAGMA table_info`, so a column declared `CLOB` (or any `LOB` type) is
//! routed through scratch variables downstream even though SQLite stores it
//! with plain TEXT affinity.

mod fetcher;

pub use fetcher::{declared_from_decl, SqliteFetcher};
