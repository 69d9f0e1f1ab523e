// JWT issuance and verification for zocalo

pub mod claims;
pub mod config;
pub mod error;
pub mod service;
pub mod token;

pub use claims::Claims;
pub use config::JwtConfig;
pub use error::{JwtError, Result};
pub use service::JwtService;
pub use token::TokenPair;

// Re-export jsonwebtoken types
pub use jsonwebtoken::Algorithm;
