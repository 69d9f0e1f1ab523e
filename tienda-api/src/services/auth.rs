//! Login and token refresh.

use crate::password::PasswordHasher;
use crate::repositories::UsuarioRepository;
use crate::services::rules;
use crate::transform::{Record, text};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use zocalo_cache::CacheStore;
use zocalo_core::Error;
use zocalo_jwt::{JwtService, TokenPair};
use zocalo_log::{error, info, warn};

/// How long a looked-up user stays cached by email.
pub const USER_CACHE_TTL: Duration = Duration::from_secs(3600);

pub const INVALID_CREDENTIALS: &str = "Credenciales inválidas";
pub const INACTIVE_USER: &str = "El usuario no está activo";

/// Cache key of the user row for `email`.
pub fn user_cache_key(email: &str) -> String {
    format!("user:email:{}", email)
}

/// Result of a well-formed login attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success(TokenPair),
    /// Credentials did not match or the account is disabled
    Rejected(&'static str),
}

/// Fresh access token issued from a refresh token.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_in: u64,
}

pub struct AuthService {
    usuarios: Arc<dyn UsuarioRepository>,
    jwt: Arc<JwtService>,
    cache: Arc<dyn CacheStore>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(
        usuarios: Arc<dyn UsuarioRepository>,
        jwt: Arc<JwtService>,
        cache: Arc<dyn CacheStore>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            usuarios,
            jwt,
            cache,
            hasher,
        }
    }

    /// Check credentials and issue a token pair.
    ///
    /// Cache failures are logged and otherwise ignored; the repository is
    /// the source of truth.
    pub async fn login(&self, input: &Record) -> Result<LoginOutcome, Error> {
        rules::LOGIN.validate(input)?;

        let email = input.get("email").map(text).unwrap_or_default();
        let password = input.get("password").map(text).unwrap_or_default();

        let usuario = match self.lookup(&email).await? {
            Some(usuario) => usuario,
            None => {
                error!(%email, "Credenciales inválidas");
                return Ok(LoginOutcome::Rejected(INVALID_CREDENTIALS));
            }
        };

        let hash = usuario.get("password").map(text).unwrap_or_default();
        if !self.hasher.verify(&password, &hash) {
            error!(%email, "Credenciales inválidas");
            return Ok(LoginOutcome::Rejected(INVALID_CREDENTIALS));
        }

        if usuario.get("status").and_then(Value::as_str) != Some("activo") {
            warn!(%email, "Usuario no está activo");
            return Ok(LoginOutcome::Rejected(INACTIVE_USER));
        }

        let payload = json!({ "id": usuario.get("id_usuario").cloned().unwrap_or(Value::Null) });
        let pair = self.jwt.generate_pair(payload)?;
        info!(%email, "Login exitoso");

        Ok(LoginOutcome::Success(pair))
    }

    /// Trade a refresh token for a new access token carrying the same data.
    pub async fn refresh(&self, input: &Record) -> Result<Option<RefreshedToken>, Error> {
        let token = input.get("refresh_token").map(text).unwrap_or_default();
        if token.is_empty() {
            return Ok(None);
        }

        let data = self.jwt.verify_token(&token)?;
        let access_token = self.jwt.generate_token(data)?;

        Ok(Some(RefreshedToken {
            access_token,
            expires_in: self.jwt.config().expires_in.as_secs(),
        }))
    }

    async fn lookup(&self, email: &str) -> Result<Option<Record>, Error> {
        let key = user_cache_key(email);

        match self.cache.get_json(&key).await {
            Ok(Some(Value::Object(usuario))) => {
                info!(%email, "Usuario obtenido desde caché");
                return Ok(Some(usuario));
            }
            Ok(_) => {}
            Err(e) => warn!(%email, error = %e, "Error al leer la caché"),
        }

        let usuario = self.usuarios.find_by_email(email).await?;
        match &usuario {
            Some(row) => {
                match self
                    .cache
                    .set_json(&key, Value::Object(row.clone()), Some(USER_CACHE_TTL))
                    .await
                {
                    Ok(()) => info!(%email, "Caché actualizado"),
                    Err(e) => error!(%email, error = %e, "Error al guardar en caché"),
                }
            }
            None => warn!(%email, "Usuario no encontrado"),
        }

        Ok(usuario)
    }
}
