use super::id_param;
use crate::services::{ClienteService, UpdateMode};
use serde_json::json;
use std::sync::Arc;
use zocalo_core::{Error, HttpRequest, HttpResponse};

pub struct ClientesController {
    service: Arc<ClienteService>,
}

impl ClientesController {
    pub fn new(service: Arc<ClienteService>) -> Self {
        Self { service }
    }

    pub async fn read_all(&self, _req: HttpRequest) -> Result<HttpResponse, Error> {
        let clientes = self.service.read_all().await?;
        Ok(HttpResponse::json(json!({ "data": clientes }), 200))
    }

    pub async fn read(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let cliente = self.service.read(&id_param(&req)).await?;
        Ok(HttpResponse::json(json!({ "data": cliente }), 200))
    }

    /// `GET /api/clientes/buscar?nombre=..&cedula=..`
    pub async fn search(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let clientes = self.service.search(&req.query()).await?;
        Ok(HttpResponse::json(json!({ "data": clientes }), 200))
    }

    pub async fn create(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let id = self.service.create(req.input()).await?;
        Ok(HttpResponse::json(
            json!({ "message": "Cliente creado exitosamente", "id": id }),
            201,
        ))
    }

    pub async fn update(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let mode = UpdateMode::from_method(&req.method);
        let cliente = self.service.update(&id_param(&req), req.input(), mode).await?;
        Ok(HttpResponse::json(
            json!({ "message": "Cliente actualizado exitosamente", "data": cliente }),
            200,
        ))
    }

    pub async fn delete(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        self.service.delete(&id_param(&req)).await?;
        Ok(HttpResponse::json(
            json!({ "message": "Cliente marcado como inactivo exitosamente" }),
            200,
        ))
    }
}
