//! Column settings parsing
//!
//! Settings arrive as a JSON-encoded string on the column metadata. Only two
//! keys matter here: `formula` on formula columns and `function` on mirror
//! columns. Everything else (status labels, color maps, ...) is ignored.

use serde::Deserialize;

/// The subset of column settings the normalizer consumes
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ColumnSettings {
    /// Formula source with `{columnId}` placeholders
    #[serde(default)]
    pub formula: Option<String>,

    /// Mirror aggregation function name
    #[serde(default)]
    pub function: Option<String>,
}

impl ColumnSettings {
    /// Parse a settings string.
    ///
    /// Returns `None` when the string is not a JSON object; malformed
    /// settings must read as "no settings", never as an error.
    pub fn parse(settings_str: &str) -> Option<ColumnSettings> {
        serde_json::from_str(settings_str).ok()
    }

    /// The aggregation function, if one is configured and recognized
    pub fn aggregate(&self) -> Option<AggregateFn> {
        AggregateFn::from_name(self.function.as_deref()?)
    }
}

/// Mirror aggregation functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Sum,
    Average,
    Min,
    Max,
    Count,
    Median,
}

impl AggregateFn {
    /// Map a settings `function` name to an aggregation.
    ///
    /// Unrecognized names (including "none") mean no aggregation.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sum" => Some(AggregateFn::Sum),
            "average" => Some(AggregateFn::Average),
            "min" => Some(AggregateFn::Min),
            "max" => Some(AggregateFn::Max),
            "count" => Some(AggregateFn::Count),
            "median" => Some(AggregateFn::Median),
            _ => None,
        }
    }
}
