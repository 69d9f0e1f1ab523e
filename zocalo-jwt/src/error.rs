// Error types for JWT operations

use thiserror::Error;
use zocalo_core::AppError;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    EncodingError(#[source] jsonwebtoken::errors::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, JwtError>;

impl JwtError {
    /// True for failures caused by the presented token rather than by us
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            JwtError::InvalidToken(_) | JwtError::TokenExpired | JwtError::InvalidSignature
        )
    }
}

impl From<JwtError> for zocalo_core::Error {
    fn from(e: JwtError) -> Self {
        if e.is_rejection() {
            AppError::new("Invalid or expired token", 401, "INVALID_TOKEN").into()
        } else {
            zocalo_core::Error::Internal(e.to_string())
        }
    }
}
