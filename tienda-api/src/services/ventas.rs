use crate::repositories::VentaRepository;
use crate::services::{UpdateMode, rules, with_id};
use crate::transform::{Record, only, to_int, without};
use serde_json::Value;
use std::sync::Arc;
use zocalo_core::{AppError, Error};
use zocalo_log::info;
use zocalo_validation::validators::is_numeric;

/// Fields a partial update may touch.
const KNOWN_FIELDS: &[&str] = &[
    "id_venta",
    "id_sucursal",
    "descuento",
    "total",
    "status",
    "nota",
    "mediopago",
    "metodo_pago",
    "estado",
    "id_cliente",
    "id_usuario",
    "cajero",
    "vendedor",
    "created_at",
    "updated_at",
];

/// Legacy columns never shown to clients.
const EXCLUDED_FIELDS: &[&str] = &[
    "tipoventa",
    "paga_con",
    "devolucion",
    "pagacon",
    "cambio",
    "abono",
    "saldo",
    "entregado",
    "registro",
    "mod",
];

pub fn format_venta(venta: &Record) -> Value {
    Value::Object(without(venta, EXCLUDED_FIELDS))
}

/// Message of a repository failure, preferring the driver's wording.
fn describe(err: &Error) -> String {
    match err {
        Error::Database(db) => db.db_error.clone(),
        other => other.to_string(),
    }
}

pub struct VentaService {
    repository: Arc<dyn VentaRepository>,
}

impl VentaService {
    pub fn new(repository: Arc<dyn VentaRepository>) -> Self {
        Self { repository }
    }

    fn parse_id(id: &str) -> Result<i64, Error> {
        if !is_numeric(&Value::from(id)) {
            return Err(AppError::invalid_operation("El ID de venta debe ser numérico").into());
        }
        Ok(to_int(&Value::from(id)))
    }

    async fn existing(&self, id: i64) -> Result<Record, Error> {
        self.repository
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("Venta").into())
    }

    pub async fn read_all(&self) -> Result<Vec<Value>, Error> {
        let ventas = self.repository.all().await?;
        Ok(ventas.iter().map(format_venta).collect())
    }

    pub async fn read(&self, id: &str) -> Result<Value, Error> {
        let id_num = Self::parse_id(id)?;
        rules::VENTA_READ.validate(&with_id(&Record::new(), "id_venta", id))?;

        let venta = self.existing(id_num).await?;
        Ok(format_venta(&venta))
    }

    pub async fn create(&self, data: Record) -> Result<u64, Error> {
        if data.is_empty() {
            return Err(AppError::invalid_operation("No se proporcionaron datos para la venta").into());
        }

        let id = self.repository.create(data).await.map_err(|e| {
            Error::from(AppError::invalid_operation(format!(
                "Error al crear la venta: {}",
                describe(&e)
            )))
        })?;

        info!(id, "Venta creada");
        Ok(id)
    }

    /// `Replace` validates the full sale; `Merge` keeps only known fields
    /// and checks types of what was sent.
    pub async fn update(&self, id: &str, data: Record, mode: UpdateMode) -> Result<(), Error> {
        let id_num = Self::parse_id(id)?;
        self.existing(id_num).await?;

        if data.is_empty() {
            return Err(AppError::invalid_operation("No se proporcionaron datos para actualizar").into());
        }

        let to_update = match mode {
            UpdateMode::Replace => {
                rules::VENTA_UPDATE.validate(&with_id(&data, "id_venta", id))?;
                data
            }
            UpdateMode::Merge => {
                rules::VENTA_PATCH.validate(&with_id(&data, "id_venta", id))?;
                only(&data, KNOWN_FIELDS)
            }
        };

        self.repository
            .update(id_num, to_update)
            .await
            .map_err(|e| {
                Error::from(AppError::invalid_operation(format!(
                    "Error al actualizar la venta: {}",
                    describe(&e)
                )))
            })?;

        info!(id = id_num, "Venta actualizada");
        Ok(())
    }

    /// Hard delete, refused while payments reference the sale.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let id_num = Self::parse_id(id)?;
        self.existing(id_num).await?;

        if !self.repository.pagos_by_venta(id_num).await?.is_empty() {
            return Err(AppError::new(
                "No se puede eliminar la venta porque tiene pagos asociados",
                409,
                "VENTA_HAS_PAYMENTS",
            )
            .into());
        }

        self.repository.delete(id_num).await.map_err(|e| {
            Error::from(AppError::invalid_operation(format!(
                "Error al eliminar la venta: {}",
                describe(&e)
            )))
        })?;

        info!(id = id_num, "Venta eliminada");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zocalo_core::DatabaseError;

    #[test]
    fn test_format_venta_drops_legacy_columns() {
        let row = json!({ "id_venta": 1, "total": "100.00", "cambio": 0, "mod": "x" });
        assert_eq!(
            format_venta(row.as_object().unwrap()),
            json!({ "id_venta": 1, "total": "100.00" })
        );
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(VentaService::parse_id("42").unwrap(), 42);
        let err = VentaService::parse_id("abc").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "El ID de venta debe ser numérico");
    }

    #[test]
    fn test_describe_prefers_driver_message() {
        let err = Error::Database(DatabaseError::new("Error al crear la venta", "Duplicate entry"));
        assert_eq!(describe(&err), "Duplicate entry");
        assert_eq!(describe(&Error::Internal("x".into())), "Internal server error: x");
    }
}
