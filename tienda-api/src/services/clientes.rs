use crate::repositories::ClienteRepository;
use crate::services::{UpdateMode, rules, with_id};
use crate::transform::{Field, Record, lowercase_strings, merge, only, project, text, to_int};
use serde_json::Value;
use std::sync::Arc;
use zocalo_core::{AppError, Error};
use zocalo_log::info;

const FIELDS: &[(&str, Field)] = &[
    ("id_cliente", Field::Int),
    ("cedula", Field::Int),
    ("nombre", Field::Capitalized),
    ("apellidos", Field::Capitalized),
    ("direccion", Field::Plain),
    ("barrio", Field::Plain),
    ("telefono", Field::Int),
    ("email", Field::Plain),
    ("estado", Field::Plain),
    ("created_at", Field::Date),
    ("updated_at", Field::Date),
];

const SEARCH_PARAMS: &[&str] = &["nombre", "apellidos", "cedula", "telefono"];

pub const NOT_FOUND: &str = "Cliente no encontrado";

pub fn format_cliente(cliente: &Record) -> Value {
    Value::Object(project(cliente, FIELDS))
}

pub struct ClienteService {
    repository: Arc<dyn ClienteRepository>,
}

impl ClienteService {
    pub fn new(repository: Arc<dyn ClienteRepository>) -> Self {
        Self { repository }
    }

    pub async fn read_all(&self) -> Result<Vec<Value>, Error> {
        let clientes = self.repository.all().await?;
        Ok(clientes.iter().map(format_cliente).collect())
    }

    pub async fn read(&self, id: &str) -> Result<Value, Error> {
        rules::CLIENTE_READ.validate(&with_id(&Record::new(), "id", id))?;

        self.repository
            .find(to_int(&Value::from(id)))
            .await?
            .map(|cliente| format_cliente(&cliente))
            .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))
    }

    /// Create a cliente from lower-cased input and return its id.
    pub async fn create(&self, data: Record) -> Result<u64, Error> {
        let cliente = lowercase_strings(&data);
        rules::CLIENTE_CREATE.validate(&cliente)?;

        if let Some(cedula) = cliente.get("cedula").map(text)
            && self.repository.find_by_cedula(&cedula).await?.is_some()
        {
            return Err(Error::validation("cedula", "La cédula ya está registrada"));
        }

        let id = self.repository.create(cliente).await?;
        info!(id, "Cliente creado");
        Ok(id)
    }

    /// Clientes matching the nombre, apellidos, cedula and telefono
    /// parameters of `query`. Other parameters are ignored.
    pub async fn search(&self, query: &Record) -> Result<Vec<Value>, Error> {
        let criteria = only(query, SEARCH_PARAMS);
        if criteria.is_empty() {
            return Err(AppError::invalid_operation(
                "Debe proporcionar al menos un criterio de búsqueda",
            )
            .into());
        }

        rules::CLIENTE_SEARCH.validate(&criteria)?;

        let clientes = self.repository.search(&criteria).await?;
        if clientes.is_empty() {
            return Err(Error::NotFound(
                "No se encontraron clientes con esos criterios".to_string(),
            ));
        }

        Ok(clientes.iter().map(format_cliente).collect())
    }

    pub async fn update(&self, id: &str, data: Record, mode: UpdateMode) -> Result<Value, Error> {
        let id_num = to_int(&Value::from(id));
        let existente = self
            .repository
            .find(id_num)
            .await?
            .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))?;

        if data.is_empty() {
            return Err(AppError::invalid_operation("No se proporcionaron datos para actualizar").into());
        }

        let data = lowercase_strings(&data);
        rules::CLIENTE_UPDATE.validate(&with_id(&data, "id", id))?;

        if let Some(cedula) = data.get("cedula").map(text)
            && existente.get("cedula").map(text).as_deref() != Some(cedula.as_str())
            && self.repository.find_by_cedula(&cedula).await?.is_some()
        {
            return Err(Error::validation(
                "cedula",
                "La cédula ya está registrada por otro cliente",
            ));
        }

        let to_update = match mode {
            UpdateMode::Replace => data,
            UpdateMode::Merge => merge(&existente, &data),
        };

        self.repository.update(id_num, to_update.clone()).await?;
        info!(id = id_num, "Cliente actualizado");

        Ok(format_cliente(&to_update))
    }

    /// Soft delete: the cliente is marked `inactivo`.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        rules::CLIENTE_DELETE.validate(&with_id(&Record::new(), "id", id))?;

        let id_num = to_int(&Value::from(id));
        if self.repository.find(id_num).await?.is_none() {
            return Err(Error::NotFound(NOT_FOUND.to_string()));
        }

        let mut data = Record::new();
        data.insert("estado".to_string(), Value::from("inactivo"));
        self.repository.update(id_num, data).await?;

        info!(id = id_num, "Cliente marcado como inactivo");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_cliente() {
        let row = json!({
            "id_cliente": 9,
            "cedula": "1098",
            "nombre": "maría",
            "apellidos": "pérez gómez",
            "telefono": "3001234567",
            "estado": "activo",
            "updated_at": null
        });

        assert_eq!(
            format_cliente(row.as_object().unwrap()),
            json!({
                "id_cliente": 9,
                "cedula": 1098,
                "nombre": "María",
                "apellidos": "Pérez gómez",
                "telefono": 3001234567i64,
                "estado": "activo",
                "updated_at": null
            })
        );
    }
}
