//! # boardpipe-core
//!
//! Core data structures for the boardpipe board normalization library.
//!
//! This crate provides the fundamental types used throughout boardpipe:
//! - [`Item`] and [`RawColumn`] - Board payloads exactly as the upstream API delivers them
//! - [`ColumnKind`] - The closed set of recognized column types
//! - [`NormalizedColumn`] and [`ColumnValue`] - The normalized output shape
//! - [`ColumnSettings`] - The settings slice parsed on demand for formula and mirror columns
//!
//! ## Example
//!
//! ```rust
//! use boardpipe_core::{ColumnKind, ColumnValue, RawColumn};
//!
//! let raw = RawColumn::new("effort", ColumnKind::Numbers).with_text("3.5");
//! assert_eq!(raw.kind, ColumnKind::Numbers);
//!
//! let value = ColumnValue::from_text(raw.text.clone());
//! assert_eq!(value.as_str(), Some("3.5"));
//! ```

pub mod column;
pub mod error;
pub mod item;
pub mod json;
pub mod kind;
pub mod settings;
pub mod value;

// Re-exports for convenience
pub use column::{ColumnMeta, NormalizedColumn, RawColumn};
pub use error::{Error, Result};
pub use item::{parse_items, ColumnMap, Group, Item};
pub use kind::ColumnKind;
pub use settings::{AggregateFn, ColumnSettings};
pub use value::{ColumnValue, LinkedRef, MirrorValue, PersonRef};

/// Separator between entries in multi-valued display text
pub const TEXT_SEPARATOR: &str = ", ";

/// Canonical rendering of timestamps in normalized output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";
