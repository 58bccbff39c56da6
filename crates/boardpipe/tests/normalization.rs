//! End-to-end tests for item normalization

use boardpipe::prelude::*;
use serde_json::json;

fn item_from(value: serde_json::Value) -> Item {
    serde_json::from_value(value).unwrap()
}

/// Test a realistic item with a mix of column kinds
#[test]
fn test_normalize_full_item() {
    let item = item_from(json!({
        "id": "4821",
        "name": "Launch checklist",
        "group": {"id": "topics", "title": "Topics"},
        "column_values": [
            {"id": "status", "type": "status", "text": "Working on it", "value": "{\"index\": 0}"},
            {"id": "effort", "type": "numbers", "text": "3.5", "value": "\"3.5\""},
            {"id": "due", "type": "date", "text": "2024-01-05 14:30",
             "value": "{\"date\": \"2024-01-05\", \"time\": \"14:30:00\"}"},
            {"id": "owner", "type": "people", "text": "Ada Lovelace",
             "value": "{\"personsAndTeams\": [{\"id\": 7, \"kind\": \"person\"}]}"},
            {"id": "site", "type": "link", "text": "Docs",
             "value": "{\"url\": \"https://example.com\", \"text\": \"Docs\"}"},
            {"id": "done", "type": "checkbox", "text": "v", "value": "{\"checked\": \"true\"}"}
        ]
    }));

    let columns = normalize(&item);
    assert_eq!(columns.len(), 8);

    assert_eq!(columns[0].value, ColumnValue::Int(4821));
    assert_eq!(columns[1].value, ColumnValue::Str("Launch checklist".into()));
    assert_eq!(columns[2].value, ColumnValue::Str("Working on it".into()));
    assert_eq!(columns[3].value, ColumnValue::Float(3.5));
    assert_eq!(
        columns[4].value,
        ColumnValue::Str("2024-01-05 14:30:00 +0000".into())
    );
    assert_eq!(
        columns[5].value,
        ColumnValue::People(vec![PersonRef::new(7)
            .with_kind("person")
            .with_text("Ada Lovelace")])
    );
    assert_eq!(columns[6].value, ColumnValue::Str("https://example.com".into()));
    assert_eq!(columns[7].value, ColumnValue::Bool(true));
}

/// Test that empty columns keep their raw value untouched
#[test]
fn test_empty_columns_pass_through() {
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "status", "type": "status", "text": "", "value": null},
            {"id": "due", "type": "date", "text": null, "value": null}
        ]
    }));

    let columns = normalize(&item);
    assert_eq!(columns[2].value, ColumnValue::Null);
    assert_eq!(columns[3].value, ColumnValue::Null);
}

/// Test that an empty vote column reads as zero, not as passthrough
#[test]
fn test_empty_vote_is_zero() {
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "votes", "type": "vote", "text": "", "value": null}
        ]
    }));

    assert_eq!(normalize(&item)[2].value, ColumnValue::Int(0));
}

/// Test numeric typing: decimal text is float, whole text is int, empty is zero
#[test]
fn test_numeric_column_typing() {
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "a", "type": "numbers", "text": "3.5", "value": "\"3.5\""},
            {"id": "b", "type": "numbers", "text": "4", "value": "\"4\""},
            {"id": "c", "type": "numbers", "text": "", "value": "\"0\""}
        ]
    }));

    let columns = normalize(&item);
    assert_eq!(columns[2].value, ColumnValue::Float(3.5));
    assert_eq!(columns[3].value, ColumnValue::Int(4));
    assert_eq!(columns[4].value, ColumnValue::Int(0));
}

/// Test formula evaluation over referenced numeric columns
#[test]
fn test_formula_subtraction() {
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "a", "type": "numbers", "text": "10", "value": "\"10\""},
            {"id": "b", "type": "numbers", "text": "3", "value": "\"3\""},
            {"id": "f", "type": "formula", "text": "", "value": null,
             "column": {"settings_str": "{\"formula\": \"{a}-{b}\"}"}}
        ]
    }));

    assert_eq!(normalize(&item)[4].value, ColumnValue::Int(7));
}

/// Test that dividing by a zero-valued column yields zero, not an error
#[test]
fn test_formula_division_by_zero() {
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "a", "type": "numbers", "text": "10", "value": "\"10\""},
            {"id": "b", "type": "numbers", "text": "0", "value": "\"0\""},
            {"id": "f", "type": "formula", "text": "", "value": null,
             "column": {"settings_str": "{\"formula\": \"{a}/{b}\"}"}}
        ]
    }));

    assert_eq!(normalize(&item)[4].value, ColumnValue::Int(0));
}

/// Test that a formula referencing a missing column keeps its value
#[test]
fn test_formula_missing_reference_unchanged() {
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "f", "type": "formula", "text": "", "value": null,
             "column": {"settings_str": "{\"formula\": \"{ghost}+1\"}"}}
        ]
    }));

    assert_eq!(normalize(&item)[2].value, ColumnValue::Null);
}

/// Test SWITCH dispatch through a formula column
#[test]
fn test_formula_switch() {
    let switch = "SWITCH({n}, 1, \"a\", 2, \"b\", \"default\")";
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "n", "type": "numbers", "text": "2", "value": "\"2\""},
            {"id": "f", "type": "formula", "text": "", "value": null,
             "column": {"settings_str": json!({"formula": switch}).to_string()}}
        ]
    }));
    assert_eq!(normalize(&item)[3].value, ColumnValue::Str("b".into()));

    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "n", "type": "numbers", "text": "9", "value": "\"9\""},
            {"id": "f", "type": "formula", "text": "", "value": null,
             "column": {"settings_str": json!({"formula": switch}).to_string()}}
        ]
    }));
    assert_eq!(normalize(&item)[3].value, ColumnValue::Str("default".into()));
}

/// Test that cyclic formula references degrade to unchanged values
#[test]
fn test_cyclic_formula_references_degrade() {
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "f1", "type": "formula", "text": "", "value": null,
             "column": {"settings_str": "{\"formula\": \"{f2}+1\"}"}},
            {"id": "f2", "type": "formula", "text": "", "value": null,
             "column": {"settings_str": "{\"formula\": \"{f1}+1\"}"}}
        ]
    }));

    let columns = normalize(&item);
    assert_eq!(columns[2].value, ColumnValue::Null);
    assert_eq!(columns[3].value, ColumnValue::Null);
}

/// Test mirror aggregation over linked display values
#[test]
fn test_mirror_aggregates() {
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "m", "type": "mirror", "text": null, "value": null,
             "display_value": "3, 4, 5",
             "column": {"settings_str": "{\"function\": \"sum\"}"}}
        ]
    }));

    let columns = normalize(&item);
    assert_eq!(
        columns[2].value,
        ColumnValue::Mirror(MirrorValue::new(ColumnValue::Float(12.0), vec![]))
    );
}

/// Test mirror median over an even number of values
#[test]
fn test_mirror_median() {
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "m", "type": "mirror", "text": null, "value": null,
             "display_value": "1, 2, 3, 100",
             "column": {"settings_str": "{\"function\": \"median\"}"}}
        ]
    }));

    let columns = normalize(&item);
    assert_eq!(
        columns[2].value,
        ColumnValue::Mirror(MirrorValue::new(ColumnValue::Float(2.5), vec![]))
    );
}

/// Test that the synthetic columns lead the output whatever the input order
#[test]
fn test_synthetic_columns_always_first() {
    let item = item_from(json!({
        "id": "777",
        "name": "Ordering",
        "column_values": [
            {"id": "z", "type": "numbers", "text": "1", "value": "\"1\""},
            {"id": "a", "type": "status", "text": "Done", "value": "{\"index\": 1}"}
        ]
    }));

    let columns = normalize(&item);
    assert_eq!(columns[0].kind, ColumnKind::ItemId);
    assert_eq!(columns[0].text.as_deref(), Some("777"));
    assert_eq!(columns[1].kind, ColumnKind::Name);
    assert_eq!(columns[1].text.as_deref(), Some("Ordering"));
}

/// Test that unsupported column kinds are dropped from the output
#[test]
fn test_unsupported_kinds_never_appear() {
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "prog", "type": "progress", "text": "", "value": null},
            {"id": "btn", "type": "button", "text": "", "value": null},
            {"id": "n", "type": "numbers", "text": "2", "value": "\"2\""}
        ]
    }));

    let columns = normalize(&item);
    let ids: Vec<&str> = columns.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["id", "name", "n"]);
}

/// Test that malformed settings read as no settings, not as an error
#[test]
fn test_invalid_settings_treated_as_absent() {
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "f", "type": "formula", "text": "", "value": null,
             "column": {"settings_str": "not json at all"}},
            {"id": "m", "type": "mirror", "text": null, "value": null,
             "display_value": "1, 2",
             "column": {"settings_str": "[]"}}
        ]
    }));

    let columns = normalize(&item);
    assert_eq!(columns[2].value, ColumnValue::Null);
    assert_eq!(
        columns[3].value,
        ColumnValue::Mirror(MirrorValue::new(ColumnValue::Str("1, 2".into()), vec![]))
    );
}

/// Test single-quote escape repair in linked-item text segments
#[test]
fn test_escape_repair_in_linked_text() {
    let item = item_from(json!({
        "id": "1",
        "name": "x",
        "column_values": [
            {"id": "dep", "type": "dependency", "text": "it's, don\\'t",
             "value": "{\"linkedPulseIds\": [{\"linkedPulseId\": 11}, {\"linkedPulseId\": 12}]}"}
        ]
    }));

    let columns = normalize(&item);
    assert_eq!(
        columns[2].value,
        ColumnValue::Links(vec![
            LinkedRef::new(11).with_text("it\\'s"),
            LinkedRef::new(12).with_text("don\\'t"),
        ])
    );
}

/// Test the serialized shape consumed by warehouse loaders
#[test]
fn test_serialized_output_shape() {
    let item = item_from(json!({
        "id": "42",
        "name": "Row",
        "column_values": [
            {"id": "n", "type": "numbers", "text": "4", "value": "\"4\"",
             "column": {"title": "Estimate"}}
        ]
    }));

    let columns = normalize(&item);
    assert_eq!(
        serde_json::to_value(&columns).unwrap(),
        json!([
            {"id": "id", "type": "item_id", "title": "Item ID", "text": "42", "value": 42},
            {"id": "name", "type": "name", "title": "Item Name", "text": "Row", "value": "Row"},
            {"id": "n", "type": "numbers", "title": "Estimate", "text": "4", "value": 4}
        ])
    );
}

/// Test parsing a whole page of items and normalizing each
#[test]
fn test_parse_and_normalize_batch() {
    let payload = json!([
        {"id": "1", "name": "First", "column_values": [
            {"id": "v", "type": "vote", "text": "", "value": null}
        ]},
        {"id": "2", "name": "Second", "column_values": []}
    ]);

    let items = parse_items(&payload.to_string()).unwrap();
    assert_eq!(items.len(), 2);

    for item in &items {
        let columns = normalize(item);
        assert!(columns.len() >= 2);
        assert_eq!(columns[0].kind, ColumnKind::ItemId);
        assert_eq!(columns[1].kind, ColumnKind::Name);
    }
}
