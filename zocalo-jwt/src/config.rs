// JWT configuration

use crate::{JwtError, Result};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};
use std::time::Duration;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for HMAC signing
    pub secret: String,

    /// Algorithm to use (default: HS256)
    pub algorithm: Algorithm,

    /// Access token lifetime (default: 1 hour)
    pub expires_in: Duration,

    /// Refresh token lifetime (default: 7 days)
    pub refresh_expires_in: Duration,

    /// Leeway for expiration checks (seconds)
    pub leeway: u64,
}

impl JwtConfig {
    /// Create a new configuration with a secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            expires_in: Duration::from_secs(3600),
            refresh_expires_in: Duration::from_secs(604800),
            leeway: 0,
        }
    }

    /// Set the algorithm; only the HMAC family is accepted
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set access token lifetime
    pub fn with_expiration(mut self, duration: Duration) -> Self {
        self.expires_in = duration;
        self
    }

    /// Set refresh token lifetime
    pub fn with_refresh_expiration(mut self, duration: Duration) -> Self {
        self.refresh_expires_in = duration;
        self
    }

    /// Set leeway
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    fn check(&self) -> Result<()> {
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(JwtError::ConfigError(format!(
                "Unsupported algorithm {:?}, expected an HMAC algorithm",
                self.algorithm
            )));
        }
        if self.secret.is_empty() {
            return Err(JwtError::ConfigError("Secret must not be empty".to_string()));
        }
        Ok(())
    }

    /// Get encoding key
    pub fn encoding_key(&self) -> Result<EncodingKey> {
        self.check()?;
        Ok(EncodingKey::from_secret(self.secret.as_bytes()))
    }

    /// Get decoding key
    pub fn decoding_key(&self) -> Result<DecodingKey> {
        self.check()?;
        Ok(DecodingKey::from_secret(self.secret.as_bytes()))
    }

    /// Get validation config
    pub fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway;
        validation
    }
}
