use crate::transform::{Record, only};
use async_trait::async_trait;
use serde_json::json;
use zocalo_core::Error;
use zocalo_database::{Db, DbResultExt};

const TABLE: &str = "ventas";
const KEY: &str = "id_venta";
const COLUMNS: &[&str] = &[
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
];

#[async_trait]
pub trait VentaRepository: Send + Sync {
    async fn all(&self) -> Result<Vec<Record>, Error>;

    async fn find(&self, id: i64) -> Result<Option<Record>, Error>;

    async fn create(&self, data: Record) -> Result<u64, Error>;

    async fn update(&self, id: i64, data: Record) -> Result<u64, Error>;

    async fn delete(&self, id: i64) -> Result<u64, Error>;

    /// Payments recorded against a sale.
    async fn pagos_by_venta(&self, id: i64) -> Result<Vec<Record>, Error>;
}

pub struct MysqlVentaRepository {
    db: Db,
}

impl MysqlVentaRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VentaRepository for MysqlVentaRepository {
    async fn all(&self) -> Result<Vec<Record>, Error> {
        self.db
            .query("SELECT * FROM ventas", &[])
            .await
            .db_context("Error al obtener las ventas")
    }

    async fn find(&self, id: i64) -> Result<Option<Record>, Error> {
        self.db
            .query_row("SELECT * FROM ventas WHERE id_venta = ?", &[json!(id)])
            .await
            .db_context("Error al buscar la venta")
    }

    async fn create(&self, data: Record) -> Result<u64, Error> {
        self.db
            .save(TABLE, &only(&data, COLUMNS))
            .await
            .db_context("Error al crear la venta")
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
            .db_context("Error al actualizar la venta")
    }

    async fn delete(&self, id: i64) -> Result<u64, Error> {
        self.db
            .execute("DELETE FROM ventas WHERE id_venta = ?", &[json!(id)], false)
            .await
            .db_context("Error al eliminar la venta")
    }

    async fn pagos_by_venta(&self, id: i64) -> Result<Vec<Record>, Error> {
        self.db
            .query("SELECT * FROM pagos WHERE id_venta = ?", &[json!(id)])
            .await
            .db_context("Error al buscar los pagos de la venta")
    }
}
