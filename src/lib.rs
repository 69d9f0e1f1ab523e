// Zocalo - a small MVC web framework for Rust
//
// One import for applications: the core request pipeline plus the optional
// JWT, cache, validation, configuration and database crates.

// Re-export core functionality
pub use zocalo_core::*;

pub use zocalo_log;

#[cfg(feature = "config")]
pub use zocalo_config;

#[cfg(feature = "jwt")]
pub use zocalo_jwt;

#[cfg(feature = "cache")]
pub use zocalo_cache;

#[cfg(feature = "validation")]
pub use zocalo_validation;

#[cfg(feature = "database")]
pub use zocalo_database;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Action, ApiSecurityMiddleware, AppError, Application, Container, CorsMiddleware, Error,
        ErrorHandlerMiddleware, HttpMethod, HttpRequest, HttpResponse, Middleware, Next, Route,
        Router, SecurityHeadersMiddleware, handler,
    };
    pub use zocalo_log::{debug, error, info, trace, warn};
}
