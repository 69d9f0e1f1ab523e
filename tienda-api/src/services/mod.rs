//! Business rules for each resource.
//!
//! Services validate input, enforce uniqueness and soft-delete rules, and
//! return domain values or [`zocalo_core::Error`]s. Shaping HTTP responses
//! is left to the controllers.

pub mod auth;
pub mod clientes;
pub mod rules;
pub mod usuarios;
pub mod ventas;

pub use auth::{AuthService, LoginOutcome, RefreshedToken};
pub use clientes::ClienteService;
pub use usuarios::UsuarioService;
pub use ventas::VentaService;

use crate::transform::Record;
use serde_json::Value;

/// How an update combines the request with the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// PUT: the request is the new row
    Replace,
    /// PATCH: the request is layered over the stored row
    Merge,
}

impl UpdateMode {
    pub fn from_method(method: &str) -> Self {
        if method.eq_ignore_ascii_case("PUT") {
            UpdateMode::Replace
        } else {
            UpdateMode::Merge
        }
    }
}

/// `data` plus the route id under `key`, for validation.
pub(crate) fn with_id(data: &Record, key: &str, id: &str) -> Record {
    let mut checked = data.clone();
    checked.insert(key.to_string(), Value::from(id));
    checked
}
