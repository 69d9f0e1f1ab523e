use crate::services::{AuthService, LoginOutcome};
use serde_json::json;
use std::sync::Arc;
use zocalo_core::{Error, HttpRequest, HttpResponse};

pub struct AuthController {
    service: Arc<AuthService>,
}

impl AuthController {
    pub fn new(service: Arc<AuthService>) -> Self {
        Self { service }
    }

    /// `POST /api/auth/login`
    pub async fn login(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let response = match self.service.login(&req.json()).await? {
            LoginOutcome::Success(pair) => HttpResponse::json(
                json!({
                    "message": "Login exitoso",
                    "access_token": pair.access_token,
                    "refresh_token": pair.refresh_token,
                    "expires_in": pair.expires_in,
                }),
                200,
            ),
            LoginOutcome::Rejected(reason) => HttpResponse::json(json!({ "error": reason }), 404),
        };
        Ok(response)
    }

    /// `POST /api/auth/refresh`
    pub async fn refresh(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let response = match self.service.refresh(&req.json()).await? {
            Some(token) => HttpResponse::json(
                json!({
                    "access_token": token.access_token,
                    "expires_in": token.expires_in,
                }),
                200,
            ),
            None => HttpResponse::json(json!({ "error": "Refresh token no proporcionado" }), 400),
        };
        Ok(response)
    }
}
