//! Building INSERT and UPDATE statements from column maps.

use crate::error::{DbError, DbResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid identifier regex"));

/// Quote a table or column name after checking it is a plain identifier.
pub fn sanitize_identifier(identifier: &str) -> DbResult<String> {
    if IDENTIFIER_REGEX.is_match(identifier) {
        Ok(format!("`{}`", identifier))
    } else {
        Err(DbError::InvalidIdentifier(identifier.to_string()))
    }
}

/// `INSERT INTO t (a, b) VALUES (?, ?)` with the values in column order.
pub fn insert(table: &str, data: &Map<String, Value>) -> DbResult<(String, Vec<Value>)> {
    if data.is_empty() {
        return Err(DbError::EmptyData);
    }

    let table = sanitize_identifier(table)?;
    let columns = data
        .keys()
        .map(|k| sanitize_identifier(k))
        .collect::<DbResult<Vec<_>>>()?;
    let placeholders = vec!["?"; columns.len()].join(", ");

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    );
    Ok((sql, data.values().cloned().collect()))
}

/// `UPDATE t SET a = ?, b = ? WHERE id = ?`, with the id value last.
///
/// Returns `None` when `data` holds nothing besides the id.
pub fn update(
    table: &str,
    id_field: &str,
    data: &Map<String, Value>,
) -> DbResult<Option<(String, Vec<Value>)>> {
    let id = data
        .get(id_field)
        .cloned()
        .ok_or_else(|| DbError::MissingField(id_field.to_string()))?;

    let table = sanitize_identifier(table)?;
    let id_column = sanitize_identifier(id_field)?;

    let mut assignments = Vec::new();
    let mut params = Vec::new();
    for (key, value) in data.iter().filter(|(k, _)| k.as_str() != id_field) {
        assignments.push(format!("{} = ?", sanitize_identifier(key)?));
        params.push(value.clone());
    }

    if assignments.is_empty() {
        return Ok(None);
    }

    params.push(id);
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table,
        assignments.join(", "),
        id_column
    );
    Ok(Some((sql, params)))
}
