//! Centralized error-to-response mapping.
//!
//! Every failure raised by a handler or middleware ends up here exactly
//! once, either through [`ErrorHandlerMiddleware`] in the global chain or
//! through the router's last-resort boundary. The mapping is
//! ordered: the first matching error kind decides the response.
//!
//! | Kind | Status | Body |
//! |------|--------|------|
//! | `Validation` | 400 | `status`, `message: "Validation failed"`, `errors` |
//! | `Database` | its code | `status`, `message`, `details` outside production |
//! | `NotFound` | 404 | `status`, `message` |
//! | `App` | its code | `status`, `message`, `error_code` |
//! | anything else | 500 | `status`, `message` (+ `details` outside production) |

use crate::logging::{debug, error, warn};
use crate::middleware::{Middleware, Next};
use crate::{Error, HttpRequest, HttpResponse};
use async_trait::async_trait;
use serde_json::{Value, json};

/// Converts an [`Error`] into the JSON response clients see.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandler {
    production: bool,
}

impl ErrorHandler {
    pub fn new(production: bool) -> Self {
        Self { production }
    }

    pub fn is_production(&self) -> bool {
        self.production
    }

    /// Map `err` to a response, logging it on the way.
    pub fn render(&self, err: &Error) -> HttpResponse {
        let status = err.status_code();

        let body = match err {
            Error::Validation(errors) => {
                debug!(?errors, "Validation failed");
                json!({
                    "status": "error",
                    "message": "Validation failed",
                    "errors": errors,
                })
            }
            Error::Database(db) => {
                error!(
                    message = %db.message,
                    db_error = %db.db_error,
                    query = db.query.as_deref().unwrap_or_default(),
                    code = db.code,
                    "Database error"
                );
                let mut body = json!({ "status": "error", "message": db.message });
                if !self.production {
                    body["details"] = serde_json::to_value(db.details()).unwrap_or(Value::Null);
                }
                body
            }
            Error::NotFound(message) => {
                debug!(%message, "Resource not found");
                json!({ "status": "error", "message": message })
            }
            Error::App(app) => {
                if status >= 500 {
                    error!(message = %app.message, error_code = %app.error_code, "Application error");
                } else {
                    warn!(message = %app.message, error_code = %app.error_code, "Application error");
                }
                json!({
                    "status": "error",
                    "message": app.message,
                    "error_code": app.error_code,
                })
            }
            Error::RouteNotFound(_)
            | Error::BadRequest(_)
            | Error::Deserialization(_)
            | Error::Unauthorized(_)
            | Error::PayloadTooLarge(_)
            | Error::UnsupportedMediaType(_) => {
                warn!(status, error = %err, "Request rejected");
                json!({ "status": "error", "message": err.to_string() })
            }
            other => {
                error!(status, error = %other, "Unhandled error");
                if self.production {
                    json!({ "status": "error", "message": "Internal server error" })
                } else {
                    json!({
                        "status": "error",
                        "message": other.to_string(),
                        "details": format!("{:?}", other),
                    })
                }
            }
        };

        HttpResponse::json(body, status)
    }
}

/// Turns any error from the inner chain into a response, so middleware
/// registered before it (CORS, security headers) still decorates error
/// responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandlerMiddleware {
    handler: ErrorHandler,
}

impl ErrorHandlerMiddleware {
    pub fn new(production: bool) -> Self {
        Self {
            handler: ErrorHandler::new(production),
        }
    }
}

#[async_trait]
impl Middleware for ErrorHandlerMiddleware {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        match next(req).await {
            Ok(response) => Ok(response),
            Err(err) => Ok(self.handler.render(&err)),
        }
    }
}
