//! Raw and normalized column types

use crate::kind::ColumnKind;
use crate::settings::ColumnSettings;
use crate::value::ColumnValue;
use serde::{Deserialize, Serialize};

/// Board-level column metadata attached to a column value.
///
/// `settings_str` is a JSON-encoded string; it is only parsed on demand
/// (formula and mirror columns), never eagerly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_str: Option<String>,
}

/// One column value as delivered by the upstream API, untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawColumn {
    /// Column id, unique within the board
    pub id: String,

    /// Column type tag
    #[serde(rename = "type")]
    pub kind: ColumnKind,

    /// Human-readable rendering of the value
    #[serde(default)]
    pub text: Option<String>,

    /// Raw value; usually a JSON-encoded string, sometimes pre-decoded JSON
    #[serde(default)]
    pub value: Option<serde_json::Value>,

    /// Board-level column metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<ColumnMeta>,

    /// Display value carried by formula and mirror columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,

    /// Linked-item references carried by mirror columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirrored_items: Option<Vec<serde_json::Value>>,
}

impl RawColumn {
    /// Create a column with the given id and kind and nothing else set
    pub fn new<S: Into<String>>(id: S, kind: ColumnKind) -> Self {
        RawColumn {
            id: id.into(),
            kind,
            text: None,
            value: None,
            column: None,
            display_value: None,
            mirrored_items: None,
        }
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.column.get_or_insert_with(ColumnMeta::default).title = Some(title.into());
        self
    }

    pub fn with_settings_str<S: Into<String>>(mut self, settings_str: S) -> Self {
        self.column
            .get_or_insert_with(ColumnMeta::default)
            .settings_str = Some(settings_str.into());
        self
    }

    pub fn with_display_value<S: Into<String>>(mut self, display_value: S) -> Self {
        self.display_value = Some(display_value.into());
        self
    }

    pub fn with_mirrored_items(mut self, items: Vec<serde_json::Value>) -> Self {
        self.mirrored_items = Some(items);
        self
    }

    /// Column title from the attached metadata
    pub fn title(&self) -> Option<&str> {
        self.column.as_ref()?.title.as_deref()
    }

    /// Parse the column's settings string.
    ///
    /// Returns `None` when there is no settings string or it is not valid
    /// settings JSON; the caller treats both the same way.
    pub fn settings(&self) -> Option<ColumnSettings> {
        let raw = self.column.as_ref()?.settings_str.as_deref()?;
        ColumnSettings::parse(raw)
    }
}

/// A column after normalization, ready for downstream mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedColumn {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
    pub title: Option<String>,
    pub text: Option<String>,
    pub value: ColumnValue,
}

impl NormalizedColumn {
    /// Build a normalized column by pairing a raw column with its resolved value
    pub fn from_raw(raw: &RawColumn, value: ColumnValue) -> Self {
        NormalizedColumn {
            id: raw.id.clone(),
            kind: raw.kind.clone(),
            title: raw.title().map(str::to_string),
            text: raw.text.clone(),
            value,
        }
    }
}
