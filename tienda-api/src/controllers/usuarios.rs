use super::id_param;
use crate::services::{UpdateMode, UsuarioService};
use serde_json::json;
use std::sync::Arc;
use zocalo_core::{Error, HttpRequest, HttpResponse};

pub struct UsuariosController {
    service: Arc<UsuarioService>,
}

impl UsuariosController {
    pub fn new(service: Arc<UsuarioService>) -> Self {
        Self { service }
    }

    pub async fn read_all(&self, _req: HttpRequest) -> Result<HttpResponse, Error> {
        let usuarios = self.service.read_all().await?;
        Ok(HttpResponse::json(json!({ "data": usuarios }), 200))
    }

    pub async fn read(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let usuario = self.service.read(&id_param(&req)).await?;
        Ok(HttpResponse::json(json!({ "data": usuario }), 200))
    }

    pub async fn create(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let id = self.service.create(req.input()).await?;
        Ok(HttpResponse::json(
            json!({ "message": "Usuario creado exitosamente", "id": id }),
            201,
        ))
    }

    /// PUT and PATCH
    pub async fn update(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let mode = UpdateMode::from_method(&req.method);
        let usuario = self.service.update(&id_param(&req), req.input(), mode).await?;
        Ok(HttpResponse::json(
            json!({ "message": "Usuario actualizado exitosamente", "data": usuario }),
            200,
        ))
    }

    pub async fn delete(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        self.service.delete(&id_param(&req)).await?;
        Ok(HttpResponse::json(
            json!({ "message": "Usuario marcado como inactivo exitosamente" }),
            200,
        ))
    }
}
