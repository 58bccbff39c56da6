//! JSON payload helpers

use serde_json::Value;

/// Truthiness of a raw JSON value, matching dynamic-language semantics:
/// null, `false`, `0`, `""`, `[]`, and `{}` are all falsy.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Decode a value that is itself a JSON-encoded string.
///
/// The upstream API transports column values as JSON strings; webhook
/// payloads sometimes arrive pre-decoded. Returns `None` when the value is
/// not a string or the string does not parse, in which case the caller keeps
/// the value as-is.
pub fn decode_string_value(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => serde_json::from_str(s).ok(),
        _ => None,
    }
}
