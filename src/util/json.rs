//! Narrowing helpers for untyped `serde_json::Value` trees.
//!
//! The import pipeline runs over values parsed from arbitrary user files,
//! so every field access goes through these instead of assuming shape.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// JS-style truthiness: `false`, `0`, `""`, `null`, and absent are falsy;
/// everything else (including empty arrays/objects) is truthy.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Render an ID field as a string. Todoist exports carry numeric IDs in
/// older dumps and string IDs in newer ones; both must compare equal.
pub fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// String field accessor.
pub fn get_str<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

/// Integer field accessor (accepts whole floats).
pub fn get_i64(obj: &Value, key: &str) -> Option<i64> {
    let v = obj.get(key)?;
    v.as_i64()
        .or_else(|| v.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

/// Float field accessor.
pub fn get_f64(obj: &Value, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

/// Parse an RFC 3339 datetime field, if present and well-formed.
pub fn get_datetime(obj: &Value, key: &str) -> Option<DateTime<Utc>> {
    parse_datetime(get_str(obj, key)?)
}

/// Parse an RFC 3339 datetime string into UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
