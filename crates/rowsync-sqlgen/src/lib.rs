//! DML synthesis for rowsync.
//!
//! Given row specifications (key bindings plus either "replace the whole
//! row" or "update these fields"), this crate fetches the current source
//! values and emits one transactional SQL block per table group:
//!
//! - whole-row specs become a DELETE followed by an INSERT of every column
//! - field specs become one UPDATE per field, all guarded by the same key
//!   predicate
//! - large-text values route through a small pool of scratch CLOB variables
//!   declared at the top of the block, because the host dialect cannot
//!   inline them as literals
//!
//! Per-specification failures (no matching row, ambiguous key, missing key
//! bindings) are collected as [`Diagnostic`]s and never abort the rest of
//! the batch; only a source fetch failure is fatal for a group.
//!
//! [`Diagnostic`]: synthesize::Diagnostic

pub mod literal;
pub mod scratch;
pub mod serialize;
pub mod spec;
pub mod statement;
pub mod synthesize;

pub use scratch::ScratchPool;
pub use serialize::{serialize_value, SerializedValue};
pub use spec::{parse_spec_text, RowSpec, SpecGroup, SpecParseError};
pub use statement::{DmlStatement, SqlBlock};
pub use synthesize::{Diagnostic, GroupOutput, SynthesisError, Synthesizer};
