use super::id_param;
use crate::services::{UpdateMode, VentaService};
use serde_json::Value;
use std::sync::Arc;
use zocalo_core::{Error, HttpRequest, HttpResponse};

/// Ventas answer with the `{status: "success", ...}` envelope.
pub struct VentasController {
    service: Arc<VentaService>,
}

impl VentasController {
    pub fn new(service: Arc<VentaService>) -> Self {
        Self { service }
    }

    pub async fn read_all(&self, _req: HttpRequest) -> Result<HttpResponse, Error> {
        let ventas = self.service.read_all().await?;
        Ok(HttpResponse::success(Value::Array(ventas), 200))
    }

    pub async fn read(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let venta = self.service.read(&id_param(&req)).await?;
        Ok(HttpResponse::success(venta, 200))
    }

    pub async fn create(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        self.service.create(req.input()).await?;
        Ok(HttpResponse::message("Venta creada correctamente", 201))
    }

    pub async fn update(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let mode = UpdateMode::from_method(&req.method);
        self.service.update(&id_param(&req), req.input(), mode).await?;
        Ok(HttpResponse::message("Venta actualizada correctamente", 200))
    }

    pub async fn delete(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        self.service.delete(&id_param(&req)).await?;
        Ok(HttpResponse::message("Venta eliminada correctamente", 200))
    }
}
