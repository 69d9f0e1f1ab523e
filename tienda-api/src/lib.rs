//! Store back office API: usuarios, clientes and ventas over MySQL with
//! JWT authentication.
//!
//! The binary in `main.rs` wires everything from the environment; the
//! library exposes the pieces so tests can assemble the same router over
//! in-memory repositories.

pub mod controllers;
pub mod middleware;
pub mod password;
pub mod providers;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod transform;

pub use middleware::JwtMiddleware;
pub use password::{HashAlgorithm, PasswordHasher};
pub use routes::build_router;
