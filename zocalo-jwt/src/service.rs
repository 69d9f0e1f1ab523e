// JWT service implementation

use crate::{Claims, JwtConfig, JwtError, Result, TokenPair};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::Value;
use zocalo_core::logging::debug;

/// Issues and verifies HS256 tokens shaped `{iat, exp, data}`
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let encoding_key = config.encoding_key()?;
        let decoding_key = config.decoding_key()?;
        let validation = config.validation();

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        let header = Header::new(self.config.algorithm);
        encode(&header, claims, &self.encoding_key).map_err(JwtError::EncodingError)
    }

    /// Access token for `data`, valid for the configured lifetime
    pub fn generate_token(&self, data: Value) -> Result<String> {
        self.generate_token_with_ttl(data, self.config.expires_in.as_secs())
    }

    pub fn generate_token_with_ttl(&self, data: Value, ttl_secs: u64) -> Result<String> {
        let ttl = i64::try_from(ttl_secs)
            .map_err(|_| JwtError::ConfigError(format!("Token lifetime too large: {}", ttl_secs)))?;
        self.sign(&Claims::new(data, ttl))
    }

    /// Refresh token for `data`, valid for the refresh lifetime
    pub fn generate_refresh_token(&self, data: Value) -> Result<String> {
        self.generate_token_with_ttl(data, self.config.refresh_expires_in.as_secs())
    }

    /// Access + refresh tokens for the same payload
    pub fn generate_pair(&self, data: Value) -> Result<TokenPair> {
        let access_token = self.generate_token(data.clone())?;
        let refresh_token = self.generate_refresh_token(data)?;

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.config.expires_in.as_secs(),
        ))
    }

    /// Verify signature and expiry and return the token's `data` payload
    pub fn verify_token(&self, token: &str) -> Result<Value> {
        self.verify_claims(token).map(|claims| claims.data)
    }

    pub fn verify_claims(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                    ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                    _ => JwtError::InvalidToken(e.to_string()),
                }
            })
    }

    /// Get the configuration
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service(secret: &str) -> JwtService {
        JwtService::new(JwtConfig::new(secret)).unwrap()
    }

    #[test]
    fn test_generate_and_verify() {
        let service = service("test-secret");
        let token = service.generate_token(json!({ "id": 7 })).unwrap();

        assert_eq!(service.verify_token(&token).unwrap(), json!({ "id": 7 }));

        let claims = service.verify_claims(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_invalid_signature() {
        let token = service("secret1").generate_token(json!({ "id": 1 })).unwrap();
        let result = service("secret2").verify_token(&token);

        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_expired_token() {
        let service = service("test-secret");
        let expired = Claims {
            iat: 1_000,
            exp: 2_000,
            data: json!({ "id": 1 }),
        };
        let token = service.sign(&expired).unwrap();

        assert!(matches!(service.verify_token(&token), Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_garbage_token() {
        let result = service("s").verify_token("not.a.jwt");
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_pair_lifetimes() {
        let service = service("test-secret");
        let pair = service.generate_pair(json!({ "id": 2 })).unwrap();

        assert_eq!(pair.expires_in, 3600);
        let refresh = service.verify_claims(&pair.refresh_token).unwrap();
        assert_eq!(refresh.exp - refresh.iat, 604800);
        assert_eq!(refresh.data, json!({ "id": 2 }));
    }
}
