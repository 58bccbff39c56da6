//! # boardpipe
//!
//! A Rust library for normalizing board item payloads into typed column
//! values.
//!
//! Boardpipe consumes items as a board API delivers them (display text plus
//! a JSON-encoded raw value per column) and produces an ordered list of
//! normalized columns ready for warehouse loading.
//!
//! ## Features
//!
//! - Typed parsing for every recognized column kind (dates, links, people,
//!   numbers, votes, checkboxes, ...)
//! - Formula column evaluation with a closed built-in function library
//! - Mirror column aggregation (sum, average, min, max, count, median)
//! - Synthetic item-id and item-name columns prepended to every item
//! - Degrades instead of failing: malformed column data falls back to the
//!   display text, never to an error
//!
//! ## Example
//!
//! ```rust
//! use boardpipe::prelude::*;
//!
//! let item = Item::from_json(
//!     r#"{
//!         "id": "42",
//!         "name": "Launch checklist",
//!         "column_values": [
//!             {"id": "effort", "type": "numbers", "text": "3.5", "value": "\"3.5\""},
//!             {"id": "votes", "type": "vote", "text": "", "value": null}
//!         ]
//!     }"#,
//! )?;
//!
//! let columns = normalize(&item);
//! assert_eq!(columns[0].id, "id");
//! assert_eq!(columns[1].id, "name");
//! assert_eq!(columns[2].value, ColumnValue::Float(3.5));
//! assert_eq!(columns[3].value, ColumnValue::Int(0));
//! # Ok::<(), boardpipe::Error>(())
//! ```

pub mod dispatch;
pub mod formula;
pub mod mirror;
pub mod normalizer;
pub mod prelude;

// Re-export the entry points
pub use dispatch::normalize_column;
pub use normalizer::normalize;

// Re-export core types
pub use boardpipe_core::{
    parse_items,
    AggregateFn,
    // Kind and settings types
    ColumnKind,
    ColumnMap,
    ColumnMeta,
    ColumnSettings,
    // Value types
    ColumnValue,
    // Error types
    Error,
    Group,
    // Payload types
    Item,
    LinkedRef,
    MirrorValue,
    NormalizedColumn,
    PersonRef,
    RawColumn,
    Result,
    // Constants
    TEXT_SEPARATOR,
    TIMESTAMP_FORMAT,
};

// Re-export the expression engine
pub use boardpipe_formula::{
    evaluate, parse_formula, EvaluationContext, FormulaError, FormulaExpr, FormulaResult,
    FormulaValue,
};
