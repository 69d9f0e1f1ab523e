//! Conversion between JSON values and MySQL parameters and rows.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Value};
use sqlx::mysql::{MySql, MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Row, TypeInfo, ValueRef};

pub(crate) type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

/// Bind every parameter in order.
pub(crate) fn bind_all<'q>(mut query: MySqlQuery<'q>, params: &[Value]) -> MySqlQuery<'q> {
    for param in params {
        query = bind_value(query, param);
    }
    query
}

fn bind_value<'q>(query: MySqlQuery<'q>, value: &Value) -> MySqlQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        // Nested values go in as their JSON text
        other => query.bind(other.to_string()),
    }
}

/// Decode a row into a JSON object keyed by column name.
///
/// DECIMAL columns come back as strings so no precision is lost, and
/// temporal columns use the `YYYY-MM-DD HH:MM:SS` form.
pub fn row_to_json(row: &MySqlRow) -> Map<String, Value> {
    row.columns()
        .iter()
        .map(|column| {
            let value = column_value(row, column.ordinal(), column.type_info().name());
            (column.name().to_string(), value)
        })
        .collect()
}

/// First column of a row.
pub(crate) fn first_value(row: &MySqlRow) -> Option<Value> {
    row.columns()
        .first()
        .map(|column| column_value(row, 0, column.type_info().name()))
}

fn column_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => {}
        _ => return Value::Null,
    }

    let unsigned = type_name.ends_with("UNSIGNED");
    let base = type_name.trim_end_matches(" UNSIGNED");

    let decoded = match base {
        "BOOLEAN" => row.try_get::<bool, _>(index).map(Value::from),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" if unsigned => {
            row.try_get::<u64, _>(index).map(Value::from)
        }
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(index).map(Value::from)
        }
        "FLOAT" | "DOUBLE" => row.try_get::<f64, _>(index).map(Value::from),
        "DATE" => row
            .try_get::<NaiveDate, _>(index)
            .map(|d| Value::from(d.format("%Y-%m-%d").to_string())),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<NaiveDateTime, _>(index)
            .map(|d| Value::from(d.format("%Y-%m-%d %H:%M:%S").to_string())),
        "TIME" => row
            .try_get::<NaiveTime, _>(index)
            .map(|t| Value::from(t.format("%H:%M:%S").to_string())),
        "JSON" => row.try_get::<Value, _>(index),
        _ => row.try_get::<String, _>(index).map(Value::from),
    };

    decoded
        .or_else(|_| row.try_get_unchecked::<String, _>(index).map(Value::from))
        .or_else(|_| {
            row.try_get_unchecked::<Vec<u8>, _>(index)
                .map(|bytes| Value::from(String::from_utf8_lossy(&bytes).into_owned()))
        })
        .unwrap_or(Value::Null)
}
