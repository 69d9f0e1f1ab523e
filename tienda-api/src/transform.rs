//! Record shaping shared by the services: field projection, loose integer
//! casts, capitalisation and date formatting.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

/// A database row or request payload keyed by column name.
pub type Record = Map<String, Value>;

/// How a single output field is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Copied unchanged
    Plain,
    /// Loose integer cast
    Int,
    /// First letter upper-cased
    Capitalized,
    /// `dd-mm-YYYY`, or null when empty
    Date,
}

impl Field {
    pub fn apply(self, value: &Value) -> Value {
        match self {
            Field::Plain => value.clone(),
            Field::Int => Value::from(to_int(value)),
            Field::Capitalized => match value {
                Value::String(s) => Value::String(capitalize(s)),
                other => other.clone(),
            },
            Field::Date => format_date(value),
        }
    }
}

/// Keep only the listed fields that are present, in list order, rendered
/// with their [`Field`] rule.
pub fn project(record: &Record, fields: &[(&str, Field)]) -> Record {
    fields
        .iter()
        .filter_map(|(name, field)| {
            record
                .get(*name)
                .map(|value| (name.to_string(), field.apply(value)))
        })
        .collect()
}

/// Copy of `record` without the listed fields.
pub fn without(record: &Record, excluded: &[&str]) -> Record {
    record
        .iter()
        .filter(|(key, _)| !excluded.contains(&key.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Copy of `record` restricted to the listed fields.
pub fn only(record: &Record, allowed: &[&str]) -> Record {
    record
        .iter()
        .filter(|(key, _)| allowed.contains(&key.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// `base` overwritten key by key with `overrides`.
pub fn merge(base: &Record, overrides: &Record) -> Record {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Lower-case every top-level string value.
pub fn lowercase_strings(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => Value::String(s.to_lowercase()),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// String form used when comparing values that may arrive as numbers or
/// strings (`"123"` and `123` are the same cedula).
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Integer value of a field, reading the leading digits of strings.
/// Anything without digits is 0.
pub fn to_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim_start();
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, s.strip_prefix('+').unwrap_or(s)),
            };
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
        }
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_date(value: &Value) -> Value {
    let raw = match value {
        Value::String(s) if !s.is_empty() => s.as_str(),
        _ => return Value::Null,
    };

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map(|date| Value::String(date.format("%d-%m-%Y").to_string()))
        .unwrap_or_else(|_| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_to_int() {
        assert_eq!(to_int(&json!(42)), 42);
        assert_eq!(to_int(&json!(4.9)), 4);
        assert_eq!(to_int(&json!("1020304050")), 1020304050);
        assert_eq!(to_int(&json!(" 12abc")), 12);
        assert_eq!(to_int(&json!("-7")), -7);
        assert_eq!(to_int(&json!("abc")), 0);
        assert_eq!(to_int(&json!(null)), 0);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("lucía"), "Lucía");
        assert_eq!(capitalize("ñandú"), "Ñandú");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_project_applies_field_rules() {
        let row = record(json!({
            "id_cliente": "7",
            "nombre": "luis",
            "created_at": "2024-03-09 14:30:00",
            "updated_at": null,
            "interno": "x"
        }));
        let fields = [
            ("id_cliente", Field::Int),
            ("nombre", Field::Capitalized),
            ("created_at", Field::Date),
            ("updated_at", Field::Date),
        ];

        assert_eq!(
            Value::Object(project(&row, &fields)),
            json!({
                "id_cliente": 7,
                "nombre": "Luis",
                "created_at": "09-03-2024",
                "updated_at": null
            })
        );
    }

    #[test]
    fn test_date_only_and_unparseable_values() {
        assert_eq!(Field::Date.apply(&json!("2024-12-31")), json!("31-12-2024"));
        assert_eq!(Field::Date.apply(&json!("ayer")), json!("ayer"));
        assert_eq!(Field::Date.apply(&json!("")), json!(null));
    }

    #[test]
    fn test_merge_only_without() {
        let base = record(json!({ "a": 1, "b": 2 }));
        let merged = merge(&base, &record(json!({ "b": 3, "c": 4 })));

        assert_eq!(Value::Object(merged.clone()), json!({ "a": 1, "b": 3, "c": 4 }));
        assert_eq!(Value::Object(only(&merged, &["a", "c"])), json!({ "a": 1, "c": 4 }));
        assert_eq!(Value::Object(without(&merged, &["a"])), json!({ "b": 3, "c": 4 }));
    }

    #[test]
    fn test_lowercase_strings() {
        let data = record(json!({ "nombre": "LUIS", "cedula": 123 }));
        assert_eq!(
            Value::Object(lowercase_strings(&data)),
            json!({ "nombre": "luis", "cedula": 123 })
        );
    }

    #[test]
    fn test_text() {
        assert_eq!(text(&json!(123)), "123");
        assert_eq!(text(&json!("123")), "123");
    }
}
