//! Per-item normalization
//!
//! Orchestrates one item end to end: build the column lookup, drop the
//! kinds that carry no extractable value, run every remaining column
//! through the dispatcher, and prepend the synthetic id and name columns.

use crate::dispatch;
use boardpipe_core::{ColumnKind, ColumnValue, Item, NormalizedColumn};

/// Normalize every supported column of one item.
///
/// The lookup map covers the full, unfiltered column list so formulas can
/// reference columns that are themselves filtered from the output. The
/// returned list always starts with the synthetic item-id and item-name
/// columns, so it is never empty.
pub fn normalize(item: &Item) -> Vec<NormalizedColumn> {
    let map = item.column_map();

    let mut columns = Vec::with_capacity(item.column_values.len() + 2);
    columns.push(item_id_column(item));
    columns.push(item_name_column(item));
    for raw in &item.column_values {
        if !raw.kind.is_supported() {
            continue;
        }
        columns.push(dispatch::normalize_column(raw, &map));
    }
    columns
}

/// Synthetic item-id column.
///
/// Item ids are numeric upstream but transported as strings; an id that
/// does not parse keeps its string form.
fn item_id_column(item: &Item) -> NormalizedColumn {
    let value = match item.id.trim().parse() {
        Ok(id) => ColumnValue::Int(id),
        Err(_) => ColumnValue::Str(item.id.clone()),
    };
    NormalizedColumn {
        id: "id".to_string(),
        kind: ColumnKind::ItemId,
        title: Some("Item ID".to_string()),
        text: Some(item.id.clone()),
        value,
    }
}

/// Synthetic item-name column
fn item_name_column(item: &Item) -> NormalizedColumn {
    NormalizedColumn {
        id: "name".to_string(),
        kind: ColumnKind::Name,
        title: Some("Item Name".to_string()),
        text: Some(item.name.clone()),
        value: ColumnValue::Str(item.name.clone()),
    }
}
