//! Type dispatcher
//!
//! Converts one raw column into a normalized column based on its kind. The
//! dispatcher never fails: a column with nothing to parse passes through
//! unchanged, and any parse problem falls back to the column's display text.

use crate::{formula, mirror};
use boardpipe_core::json::{decode_string_value, is_falsy};
use boardpipe_core::{
    ColumnKind, ColumnMap, ColumnValue, LinkedRef, NormalizedColumn, PersonRef, RawColumn,
    TEXT_SEPARATOR, TIMESTAMP_FORMAT,
};
use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Normalize a single column against its item's column map.
///
/// Formula columns resolve their references through the map; every other
/// kind only reads its own fields.
pub fn normalize_column(raw: &RawColumn, map: &ColumnMap) -> NormalizedColumn {
    let mut visiting = HashSet::from([raw.id.clone()]);
    dispatch_column(raw, map, &mut visiting)
}

/// Dispatch one column to its kind's parsing rule.
///
/// `visiting` holds the ids currently being resolved, so cyclic formula
/// references read as missing instead of recursing forever.
pub(crate) fn dispatch_column(
    raw: &RawColumn,
    map: &ColumnMap,
    visiting: &mut HashSet<String>,
) -> NormalizedColumn {
    // Nothing usable to parse. Vote still gets its zero default, and
    // formula and mirror columns carry their payload in settings and
    // display_value rather than in text and value.
    if !skips_empty_passthrough(&raw.kind)
        && text_is_blank(&raw.text)
        && value_is_falsy(&raw.value)
    {
        return NormalizedColumn::from_raw(raw, raw_value(raw));
    }

    let value = normalize_value(raw, map, visiting).unwrap_or_else(|| {
        tracing::debug!(
            "Falling back to display text for {} column {}",
            raw.kind,
            raw.id
        );
        ColumnValue::from_text(raw.text.clone())
    });
    NormalizedColumn::from_raw(raw, value)
}

/// Resolve a referenced column to its normalized form.
///
/// Returns `None` when the id is not in the map or is already being
/// resolved higher up the call stack; formula substitution treats both as
/// a missing reference.
pub(crate) fn resolve(
    id: &str,
    map: &ColumnMap,
    visiting: &mut HashSet<String>,
) -> Option<NormalizedColumn> {
    let raw = map.get(id)?;
    if !visiting.insert(id.to_string()) {
        return None;
    }
    let normalized = dispatch_column(raw, map, visiting);
    visiting.remove(id);
    Some(normalized)
}

/// The column's raw value, carried over untouched
pub(crate) fn raw_value(raw: &RawColumn) -> ColumnValue {
    match &raw.value {
        None | Some(Value::Null) => ColumnValue::Null,
        Some(value) => ColumnValue::Json(value.clone()),
    }
}

fn normalize_value(
    raw: &RawColumn,
    map: &ColumnMap,
    visiting: &mut HashSet<String>,
) -> Option<ColumnValue> {
    let decoded = decoded_value(raw);
    match &raw.kind {
        ColumnKind::ItemId | ColumnKind::Rating | ColumnKind::AutoNumber => {
            int_from_text(raw.text.as_deref())
        }
        ColumnKind::Vote => vote_value(raw.text.as_deref()),
        ColumnKind::Checkbox => checkbox_value(&decoded?),
        ColumnKind::Date => date_value(&decoded?, raw.text.as_deref()),
        ColumnKind::Dependency | ColumnKind::BoardRelation | ColumnKind::Subtasks => {
            linked_value(&decoded?, raw.text.as_deref())
        }
        ColumnKind::Dropdown | ColumnKind::Tags => Some(label_list(raw.text.as_deref())),
        ColumnKind::People | ColumnKind::Team => people_value(&decoded?, raw.text.as_deref()),
        ColumnKind::File => Some(ColumnValue::Json(decoded?.get("files")?.clone())),
        ColumnKind::Link => link_value(&decoded?),
        ColumnKind::Numbers => numeric_value(raw.text.as_deref()),
        ColumnKind::CreationLog | ColumnKind::LastUpdated => log_timestamp(raw.text.as_deref()),
        ColumnKind::Duration | ColumnKind::Integration => Some(structured_value(decoded)),
        ColumnKind::Formula => Some(formula::evaluate_formula_column(raw, map, visiting)),
        ColumnKind::Mirror => Some(mirror::aggregate_mirror_column(raw)),
        ColumnKind::Name | ColumnKind::Progress | ColumnKind::Button | ColumnKind::Unknown(_) => {
            Some(ColumnValue::from_text(raw.text.clone()))
        }
    }
}

fn skips_empty_passthrough(kind: &ColumnKind) -> bool {
    matches!(
        kind,
        ColumnKind::Vote | ColumnKind::Formula | ColumnKind::Mirror
    )
}

fn text_is_blank(text: &Option<String>) -> bool {
    text.as_deref().map_or(true, str::is_empty)
}

fn value_is_falsy(value: &Option<Value>) -> bool {
    value.as_ref().map_or(true, is_falsy)
}

/// The value with one layer of JSON string encoding removed, when present
fn decoded_value(raw: &RawColumn) -> Option<Value> {
    let value = raw.value.as_ref()?;
    Some(decode_string_value(value).unwrap_or_else(|| value.clone()))
}

fn int_from_text(text: Option<&str>) -> Option<ColumnValue> {
    let n = text?.trim().parse().ok()?;
    Some(ColumnValue::Int(n))
}

/// Votes default to zero instead of passing through empty
fn vote_value(text: Option<&str>) -> Option<ColumnValue> {
    match text {
        Some(t) if !t.is_empty() => int_from_text(Some(t)),
        _ => Some(ColumnValue::Int(0)),
    }
}

/// The API reports the checked flag as the string "true". Any other
/// shape, a JSON boolean included, reads as unchecked.
fn checkbox_value(decoded: &Value) -> Option<ColumnValue> {
    let on = matches!(decoded.get("checked")?, Value::String(s) if s == "true");
    Some(ColumnValue::Bool(on))
}

/// Date columns carry `{date, time}`. With a time the two combine into a
/// UTC timestamp; without one the display text already says everything.
fn date_value(decoded: &Value, text: Option<&str>) -> Option<ColumnValue> {
    let time = decoded
        .get("time")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty());
    match time {
        Some(time) => {
            let date = decoded.get("date").and_then(Value::as_str)?;
            let stamp = format!("{} {}", date, time);
            let naive = NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S").ok()?;
            Some(ColumnValue::Str(
                naive.and_utc().format(TIMESTAMP_FORMAT).to_string(),
            ))
        }
        None => Some(ColumnValue::from_text(text)),
    }
}

/// Linked items pair each id from the value with the matching segment of
/// the display text. A value without a `linkedPulseIds` list means no
/// links; text with fewer segments than ids means the payload is
/// inconsistent and the whole parse falls back.
fn linked_value(decoded: &Value, text: Option<&str>) -> Option<ColumnValue> {
    let entries = match decoded.get("linkedPulseIds").and_then(Value::as_array) {
        Some(entries) => entries,
        None => return Some(ColumnValue::Links(Vec::new())),
    };
    let segments = text.filter(|t| !t.is_empty()).map(split_segments);
    let mut links = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let id = entry.get("linkedPulseId").and_then(Value::as_i64)?;
        let mut link = LinkedRef::new(id);
        if let Some(segments) = &segments {
            link = link.with_text(segments.get(index)?);
        }
        links.push(link);
    }
    Some(ColumnValue::Links(links))
}

fn people_value(decoded: &Value, text: Option<&str>) -> Option<ColumnValue> {
    let entries = decoded.get("personsAndTeams")?.as_array()?;
    let segments = split_segments(text?);
    let mut people = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let id = entry.get("id").and_then(Value::as_i64)?;
        let mut person = PersonRef::new(id);
        if let Some(kind) = entry.get("kind").and_then(Value::as_str) {
            person = person.with_kind(kind);
        }
        people.push(person.with_text(segments.get(index)?));
    }
    Some(ColumnValue::People(people))
}

/// Dropdown and tag labels, split on the list separator.
///
/// Empty text stays empty text and missing text stays null; both mean no
/// labels but serialize differently downstream.
fn label_list(text: Option<&str>) -> ColumnValue {
    match text {
        Some(t) if !t.is_empty() => {
            ColumnValue::StrList(t.split(TEXT_SEPARATOR).map(str::to_string).collect())
        }
        Some(t) => ColumnValue::Str(t.to_string()),
        None => ColumnValue::Null,
    }
}

fn link_value(decoded: &Value) -> Option<ColumnValue> {
    match decoded.get("url")? {
        Value::String(url) => Some(ColumnValue::Str(url.clone())),
        Value::Null => Some(ColumnValue::Null),
        other => Some(ColumnValue::Json(other.clone())),
    }
}

/// Numbers keep int and float apart: a decimal point in the text means
/// float, otherwise int, and empty text counts as zero.
fn numeric_value(text: Option<&str>) -> Option<ColumnValue> {
    let text = text?;
    if text.contains('.') {
        Some(ColumnValue::Float(text.trim().parse().ok()?))
    } else if text.is_empty() {
        Some(ColumnValue::Int(0))
    } else {
        Some(ColumnValue::Int(text.trim().parse().ok()?))
    }
}

/// Creation and last-updated text reads "2023-01-25 16:46:29 UTC"; the
/// zone name is dropped and the stamp re-rendered with a numeric offset.
fn log_timestamp(text: Option<&str>) -> Option<ColumnValue> {
    let (stamp, _zone) = text?.rsplit_once(' ')?;
    let naive = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").ok()?;
    Some(ColumnValue::Str(
        naive.and_utc().format(TIMESTAMP_FORMAT).to_string(),
    ))
}

/// Duration and integration values stay structured
fn structured_value(decoded: Option<Value>) -> ColumnValue {
    match decoded {
        None | Some(Value::Null) => ColumnValue::Null,
        Some(value) => ColumnValue::Json(value),
    }
}

/// Split display text on the list separator, normalizing quote escapes in
/// each segment
fn split_segments(text: &str) -> Vec<String> {
    text.split(TEXT_SEPARATOR).map(repair_quotes).collect()
}

/// Collapse any run of backslashes before a single quote to exactly one.
///
/// Upstream text arrives with inconsistent quote escaping depending on the
/// API path; both `it's` and `it\'s` normalize to `it\'s`.
fn repair_quotes(segment: &str) -> String {
    static QUOTE_RUN: OnceLock<Regex> = OnceLock::new();
    let re = QUOTE_RUN.get_or_init(|| Regex::new(r"\\*'").unwrap());
    re.replace_all(segment, r"\'").into_owned()
}
