// Core library for the zocalo HTTP framework
// Request/response model, routing, middleware chaining, error mapping and DI

pub mod application;
pub mod container;
pub mod error;
pub mod error_handler;
pub mod form;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod routing;
pub mod traits;

// Re-export commonly used types
pub use application::*;
pub use container::*;
pub use error::*;
pub use error_handler::*;
pub use form::*;
pub use http::*;
pub use middleware::*;
pub use routing::{Action, Route, RoutePattern, Router};
pub use traits::*;
