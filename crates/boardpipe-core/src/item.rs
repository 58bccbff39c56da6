//! Board item payloads

use crate::column::RawColumn;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Group placement of an item on its board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One board item as delivered by the upstream API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Item id (numeric, but transported as a string)
    pub id: String,

    /// Item display name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,

    #[serde(default)]
    pub column_values: Vec<RawColumn>,
}

impl Item {
    /// Parse a single item from JSON text
    pub fn from_json(json: &str) -> Result<Item> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a column lookup over this item's full, unfiltered column list
    pub fn column_map(&self) -> ColumnMap {
        ColumnMap::from_columns(&self.column_values)
    }
}

/// Parse one item or a list of items from JSON text.
///
/// Accepts either a single item object or an array of them, so callers can
/// feed both an items-page slice and a lone webhook payload through the same
/// entry point.
pub fn parse_items(json: &str) -> Result<Vec<Item>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    match value {
        serde_json::Value::Array(entries) => entries
            .into_iter()
            .map(|entry| serde_json::from_value(entry).map_err(Error::from))
            .collect(),
        object @ serde_json::Value::Object(_) => {
            let item: Item = serde_json::from_value(object)?;
            Ok(vec![item])
        }
        other => Err(Error::InvalidItem(format!(
            "expected an item object or an array of items, got {}",
            other
        ))),
    }
}

/// Read-only lookup of raw columns by id.
///
/// Built once per item from the full column list, before any filtering, so
/// formula columns can reference columns of unsupported kinds.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: HashMap<String, RawColumn>,
}

impl ColumnMap {
    /// Build a map from a column slice; later duplicates win, matching a
    /// keyed insert over the list
    pub fn from_columns(columns: &[RawColumn]) -> Self {
        let mut map = HashMap::with_capacity(columns.len());
        for column in columns {
            map.insert(column.id.clone(), column.clone());
        }
        ColumnMap { columns: map }
    }

    pub fn get(&self, id: &str) -> Option<&RawColumn> {
        self.columns.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.columns.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
