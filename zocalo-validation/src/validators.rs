//! Value predicates used by the rule engine.
//!
//! These operate on raw JSON values as they arrive in a request body, so
//! numbers and booleans are judged by their string form where a rule is
//! about text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("valid email regex")
});

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?\s*$")
        .expect("valid numeric regex")
});

/// True for values a `required` rule rejects.
///
/// Absent and `null`, `""`, `"0"`, `false`, numeric zero, and empty arrays
/// or objects all count as empty.
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty() || s == "0",
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
    }
}

pub fn is_email(value: &Value) -> bool {
    match value {
        Value::String(s) => s.len() <= 254 && EMAIL_REGEX.is_match(s),
        _ => false,
    }
}

/// Numbers, and strings that spell a decimal or exponent number.
pub fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => NUMERIC_REGEX.is_match(s),
        _ => false,
    }
}

/// Length in characters of the value's string form.
pub fn char_len(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        Value::Bool(true) => 1,
        Value::Bool(false) | Value::Null => 0,
        other => other.to_string().chars().count(),
    }
}
