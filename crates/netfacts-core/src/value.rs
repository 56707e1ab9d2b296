//! JSON-shaped value tree helpers
//!
//! Values are plain `serde_json` values with insertion-ordered maps, so the
//! order directives produce keys in is the order they are emitted in.

pub use serde_json::{Map, Value};

/// Truthiness used by `when` conditions.
///
/// `null`, `false`, `0`, the empty string and empty collections are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Short name of the value's type, for messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Render a value as text for interpolation.
///
/// Strings are emitted raw, null is empty, everything else as compact JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a templated string to its native form.
///
/// Integer-looking strings become numbers and empty strings become null;
/// every other value passes through unchanged.
pub fn coerce_native(value: Value) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else if let Ok(n) = trimmed.parse::<i64>() {
                Value::from(n)
            } else {
                Value::String(s)
            }
        }
        other => other,
    }
}

/// Loose equality used by `==` / `!=` conditions.
///
/// Numbers and strings compare by their rendered text, so a captured
/// `"1500"` equals a literal `1500`.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(s), Value::Number(_)) | (Value::Number(_), Value::String(s)) => {
            let other = if matches!(left, Value::String(_)) { right } else { left };
            s.trim() == render(other)
        }
        _ => left == right,
    }
}
