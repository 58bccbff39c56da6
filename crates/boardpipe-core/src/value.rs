//! Normalized column value types

use serde::{Deserialize, Serialize};
use std::fmt;

/// The resolved value of a normalized column.
///
/// Serializes untagged, so downstream consumers see plain JSON scalars,
/// lists, and objects rather than an enum wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    /// No value (serializes as JSON null)
    Null,

    /// Boolean value (checkbox)
    Bool(bool),

    /// Integer value (ratings, votes, whole numbers)
    Int(i64),

    /// Floating-point value (numbers with a decimal part, aggregates)
    Float(f64),

    /// String value (dates render here in their canonical form)
    Str(String),

    /// List of strings (dropdown and tag labels)
    StrList(Vec<String>),

    /// Linked-item references (dependency, board relation, subtasks)
    Links(Vec<LinkedRef>),

    /// Person and team references
    People(Vec<PersonRef>),

    /// Aggregated mirror value
    Mirror(MirrorValue),

    /// Structured passthrough (duration, integration, file lists)
    Json(serde_json::Value),
}

impl ColumnValue {
    /// Build a value from a column's display text: the text itself, or null
    pub fn from_text<S: Into<String>>(text: Option<S>) -> Self {
        match text {
            Some(t) => ColumnValue::Str(t.into()),
            None => ColumnValue::Null,
        }
    }

    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    /// Check for null or the empty string
    pub fn is_empty(&self) -> bool {
        match self {
            ColumnValue::Null => true,
            ColumnValue::Str(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Try to get the value as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ColumnValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Int(n) => Some(*n as f64),
            ColumnValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the type name for log messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValue::Null => "null",
            ColumnValue::Bool(_) => "bool",
            ColumnValue::Int(_) => "int",
            ColumnValue::Float(_) => "float",
            ColumnValue::Str(_) => "string",
            ColumnValue::StrList(_) => "string_list",
            ColumnValue::Links(_) => "links",
            ColumnValue::People(_) => "people",
            ColumnValue::Mirror(_) => "mirror",
            ColumnValue::Json(_) => "json",
        }
    }
}

impl Default for ColumnValue {
    fn default() -> Self {
        ColumnValue::Null
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Null => write!(f, ""),
            ColumnValue::Bool(b) => write!(f, "{}", b),
            ColumnValue::Int(n) => write!(f, "{}", n),
            ColumnValue::Float(n) => write!(f, "{}", n),
            ColumnValue::Str(s) => write!(f, "{}", s),
            other => {
                let rendered = serde_json::to_string(other).unwrap_or_default();
                write!(f, "{}", rendered)
            }
        }
    }
}

impl From<bool> for ColumnValue {
    fn from(b: bool) -> Self {
        ColumnValue::Bool(b)
    }
}

impl From<i64> for ColumnValue {
    fn from(n: i64) -> Self {
        ColumnValue::Int(n)
    }
}

impl From<f64> for ColumnValue {
    fn from(n: f64) -> Self {
        ColumnValue::Float(n)
    }
}

impl From<&str> for ColumnValue {
    fn from(s: &str) -> Self {
        ColumnValue::Str(s.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(s: String) -> Self {
        ColumnValue::Str(s)
    }
}

impl From<Vec<String>> for ColumnValue {
    fn from(list: Vec<String>) -> Self {
        ColumnValue::StrList(list)
    }
}

impl From<serde_json::Value> for ColumnValue {
    fn from(value: serde_json::Value) -> Self {
        ColumnValue::Json(value)
    }
}

/// A reference to a linked item, paired with its display text segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedRef {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl LinkedRef {
    pub fn new(id: i64) -> Self {
        LinkedRef { id, text: None }
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// A person or team assignment, paired with its display text segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl PersonRef {
    pub fn new(id: i64) -> Self {
        PersonRef {
            id,
            kind: None,
            text: None,
        }
    }

    pub fn with_kind<S: Into<String>>(mut self, kind: S) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// The output of mirror-column aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirrorValue {
    /// The aggregate, or the raw display value when no aggregation applies
    pub display_value: Box<ColumnValue>,
    /// Linked-item references carried by the column, empty when absent
    pub mirrored_items: Vec<serde_json::Value>,
}

impl MirrorValue {
    pub fn new(display_value: ColumnValue, mirrored_items: Vec<serde_json::Value>) -> Self {
        MirrorValue {
            display_value: Box::new(display_value),
            mirrored_items,
        }
    }
}
