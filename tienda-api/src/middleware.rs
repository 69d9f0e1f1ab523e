// Bearer token authentication for protected routes

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;
use zocalo_core::{Error, HttpRequest, HttpResponse, Middleware, Next};
use zocalo_jwt::JwtService;
use zocalo_log::debug;

static BEARER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Bearer\s(\S+)").expect("valid bearer regex"));

/// Request attribute holding the verified token payload.
pub const USER_ATTRIBUTE: &str = "usuario";

/// Token carried by an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    BEARER
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Rejects requests without a valid access token.
///
/// On success the token's data payload is stored under
/// [`USER_ATTRIBUTE`] for the handler.
#[derive(Clone)]
pub struct JwtMiddleware {
    jwt: Arc<JwtService>,
}

impl JwtMiddleware {
    pub fn new(jwt: Arc<JwtService>) -> Self {
        Self { jwt }
    }
}

#[async_trait]
impl Middleware for JwtMiddleware {
    async fn handle(&self, mut req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        let token = match req.header("Authorization").and_then(bearer_token) {
            Some(token) => token.to_string(),
            None => {
                debug!(path = %req.path, "Missing bearer token");
                return Ok(HttpResponse::json(
                    json!({ "error": "Token no suministrado" }),
                    401,
                ));
            }
        };

        match self.jwt.verify_token(&token) {
            Ok(data) => {
                req.set_attribute(USER_ATTRIBUTE, data);
                next(req).await
            }
            Err(e) if e.is_rejection() => {
                debug!(path = %req.path, error = %e, "Bearer token rejected");
                Ok(HttpResponse::json(
                    json!({
                        "error": "Token inválido o expirado",
                        "message": "Por favor, usa el refresh token para obtener un nuevo access token"
                    }),
                    401,
                ))
            }
            Err(e) => Err(e.into()),
        }
    }
}
