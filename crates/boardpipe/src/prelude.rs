//! Prelude module - common imports for boardpipe users
//!
//! ```rust
//! use boardpipe::prelude::*;
//! ```

pub use crate::{
    // Entry points
    normalize,
    normalize_column,
    parse_items,
    // Kind and settings types
    AggregateFn,
    ColumnKind,
    ColumnMap,
    ColumnSettings,
    // Value types
    ColumnValue,
    // Error types
    Error,
    // Payload types
    Item,
    LinkedRef,
    MirrorValue,
    NormalizedColumn,
    PersonRef,
    RawColumn,
    Result,
};
