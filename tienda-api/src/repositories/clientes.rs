use crate::transform::{Record, only, text};
use async_trait::async_trait;
use serde_json::{Value, json};
use zocalo_core::Error;
use zocalo_database::{Db, DbResultExt};

const TABLE: &str = "clientes";
const KEY: &str = "id_cliente";
const COLUMNS: &[&str] = &[
    "cedula",
    "nombre",
    "apellidos",
    "direccion",
    "barrio",
    "telefono",
    "email",
    "estado",
];
const LIKE_COLUMNS: &[&str] = &["nombre", "apellidos", "cedula", "telefono"];

#[async_trait]
pub trait ClienteRepository: Send + Sync {
    async fn all(&self) -> Result<Vec<Record>, Error>;

    async fn find(&self, id: i64) -> Result<Option<Record>, Error>;

    async fn find_by_cedula(&self, cedula: &str) -> Result<Option<Record>, Error>;

    async fn create(&self, data: Record) -> Result<u64, Error>;

    /// Clientes matching every criterion. See [`search_statement`].
    async fn search(&self, criteria: &Record) -> Result<Vec<Record>, Error>;

    /// Update the whitelisted columns present in `data`; returns 0 when
    /// none are.
    async fn update(&self, id: i64, data: Record) -> Result<u64, Error>;
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(value) => {
            let s = text(value);
            s.is_empty() || s == "0"
        }
    }
}

/// SELECT for a cliente search.
///
/// `id` matches `id_cliente` exactly; nombre, apellidos, cedula and
/// telefono match as trimmed substrings. Blank criteria are ignored.
pub fn search_statement(criteria: &Record) -> (String, Vec<Value>) {
    let mut sql = String::from("SELECT * FROM clientes WHERE 1=1");
    let mut params = Vec::new();

    if !is_blank(criteria.get("id")) {
        sql.push_str(" AND id_cliente = ?");
        params.push(criteria["id"].clone());
    }

    for column in LIKE_COLUMNS {
        if let Some(value) = criteria.get(*column).filter(|v| !is_blank(Some(*v))) {
            sql.push_str(&format!(" AND {} LIKE ?", column));
            params.push(Value::String(format!("%{}%", text(value).trim())));
        }
    }

    (sql, params)
}

pub struct MysqlClienteRepository {
    db: Db,
}

impl MysqlClienteRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClienteRepository for MysqlClienteRepository {
    async fn all(&self) -> Result<Vec<Record>, Error> {
        self.db
            .query("SELECT * FROM clientes", &[])
            .await
            .db_context("Error al obtener los clientes")
    }

    async fn find(&self, id: i64) -> Result<Option<Record>, Error> {
        self.db
            .query_row("SELECT * FROM clientes WHERE id_cliente = ?", &[json!(id)])
            .await
            .db_context("Error al buscar el cliente")
    }

    async fn find_by_cedula(&self, cedula: &str) -> Result<Option<Record>, Error> {
        self.db
            .query_row("SELECT * FROM clientes WHERE cedula = ?", &[json!(cedula)])
            .await
            .db_context("Error al buscar el cliente por cédula")
    }

    async fn create(&self, data: Record) -> Result<u64, Error> {
        self.db
            .save(TABLE, &only(&data, COLUMNS))
            .await
            .db_context("Error al crear el cliente")
    }

    async fn search(&self, criteria: &Record) -> Result<Vec<Record>, Error> {
        let (sql, params) = search_statement(criteria);
        self.db
            .query(&sql, &params)
            .await
            .db_context("Error al buscar clientes")
    }

    async fn update(&self, id: i64, data: Record) -> Result<u64, Error> {
        let mut data = only(&data, COLUMNS);
        if data.is_empty() {
            return Ok(0);
        }
        data.insert(KEY.to_string(), json!(id));

        self.db
            .update_item(TABLE, KEY, &data)
            .await
            .db_context("Error al actualizar el cliente")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_search_statement_like_criteria() {
        let (sql, params) = search_statement(&criteria(json!({
            "nombre": "  ana ",
            "telefono": 300
        })));

        assert_eq!(
            sql,
            "SELECT * FROM clientes WHERE 1=1 AND nombre LIKE ? AND telefono LIKE ?"
        );
        assert_eq!(params, vec![json!("%ana%"), json!("%300%")]);
    }

    #[test]
    fn test_search_statement_exact_id() {
        let (sql, params) = search_statement(&criteria(json!({ "id": "12", "cedula": "10" })));

        assert_eq!(
            sql,
            "SELECT * FROM clientes WHERE 1=1 AND id_cliente = ? AND cedula LIKE ?"
        );
        assert_eq!(params, vec![json!("12"), json!("%10%")]);
    }

    #[test]
    fn test_search_statement_skips_blank_and_unknown() {
        let (sql, params) = search_statement(&criteria(json!({
            "nombre": "",
            "apellidos": null,
            "barrio": "centro"
        })));

        assert_eq!(sql, "SELECT * FROM clientes WHERE 1=1");
        assert!(params.is_empty());
    }
}
