// Error types for the zocalo framework

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Per-field validation messages, ordered by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-level failure carrying an HTTP code and a machine-readable
/// error code clients can branch on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub message: String,
    pub code: u16,
    pub error_code: String,
}

impl AppError {
    pub fn new(message: impl Into<String>, code: u16, error_code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            error_code: error_code.into(),
        }
    }

    /// 500 `GENERAL_ERROR`
    pub fn general(message: impl Into<String>) -> Self {
        Self::new(message, 500, "GENERAL_ERROR")
    }

    /// 404 `RESOURCE_NOT_FOUND` with message `"<resource> no encontrado"`
    pub fn not_found(resource: &str) -> Self {
        Self::new(format!("{} no encontrado", resource), 404, "RESOURCE_NOT_FOUND")
    }

    /// 400 `INVALID_OPERATION`
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(message, 400, "INVALID_OPERATION")
    }

    /// 401 `UNAUTHORIZED`
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, 401, "UNAUTHORIZED")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AppError {}

/// Database failure as seen past the repository boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseError {
    /// Message safe to show to clients
    pub message: String,
    /// Raw driver message
    pub db_error: String,
    /// Failing statement, when known
    pub query: Option<String>,
    pub code: u16,
}

/// Internal details of a [`DatabaseError`], only rendered outside production.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DatabaseErrorDetails {
    pub message: String,
    pub db_error: String,
    pub query: Option<String>,
    pub code: u16,
}

impl DatabaseError {
    pub fn new(message: impl Into<String>, db_error: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            db_error: db_error.into(),
            query: None,
            code: 500,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    pub fn details(&self) -> DatabaseErrorDetails {
        DatabaseErrorDetails {
            message: self.message.clone(),
            db_error: self.db_error.clone(),
            query: self.query.clone(),
            code: self.code,
        }
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DatabaseError {}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    App(AppError),

    #[error("{0}")]
    Database(DatabaseError),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported Media Type: {0}")]
    UnsupportedMediaType(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// Unclassified failure; `code` is used as the status when it is a valid
    /// HTTP status.
    #[error("{message}")]
    Unexpected { message: String, code: Option<u16> },
}

impl Error {
    /// `NotFound` with the default message
    pub fn not_found() -> Self {
        Error::NotFound("Resource not found".to_string())
    }

    /// Single-field validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        Error::Validation(errors)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Error::Unexpected {
            message: message.into(),
            code: None,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::App(e) => valid_status(e.code).unwrap_or(500),
            Error::Database(e) => valid_status(e.code).unwrap_or(500),
            Error::RouteNotFound(_) => 404,
            Error::BadRequest(_) | Error::Deserialization(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::PayloadTooLarge(_) => 413,
            Error::UnsupportedMediaType(_) => 415,
            Error::Unexpected { code, .. } => code.and_then(valid_status).unwrap_or(500),
            Error::ProviderNotFound(_)
            | Error::Serialization(_)
            | Error::Io(_)
            | Error::Internal(_) => 500,
        }
    }
}

fn valid_status(code: u16) -> Option<u16> {
    (100..600).contains(&code).then_some(code)
}

impl From<AppError> for Error {
    fn from(e: AppError) -> Self {
        Error::App(e)
    }
}

impl From<DatabaseError> for Error {
    fn from(e: DatabaseError) -> Self {
        Error::Database(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
