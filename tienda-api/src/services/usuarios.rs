use crate::repositories::UsuarioRepository;
use crate::services::auth::user_cache_key;
use crate::services::{UpdateMode, rules, with_id};
use crate::transform::{Field, Record, merge, project, text, to_int};
use serde_json::Value;
use std::sync::Arc;
use zocalo_cache::CacheStore;
use zocalo_core::{AppError, Error};
use zocalo_log::{info, warn};

const FIELDS: &[(&str, Field)] = &[
    ("id_usuario", Field::Int),
    ("cedula", Field::Int),
    ("nombre", Field::Plain),
    ("apellidos", Field::Plain),
    ("email", Field::Plain),
    ("role", Field::Plain),
    ("status", Field::Plain),
    ("registro", Field::Plain),
    ("created_at", Field::Date),
    ("updated_at", Field::Date),
];

pub const NOT_FOUND: &str = "Usuario no encontrado";
const EMAIL_TAKEN: &str = "El email ya está en uso";

/// Public shape of a user row. The password hash never leaves here.
pub fn format_usuario(usuario: &Record) -> Value {
    Value::Object(project(usuario, FIELDS))
}

pub struct UsuarioService {
    repository: Arc<dyn UsuarioRepository>,
    cache: Arc<dyn CacheStore>,
}

impl UsuarioService {
    pub fn new(repository: Arc<dyn UsuarioRepository>, cache: Arc<dyn CacheStore>) -> Self {
        Self { repository, cache }
    }

    pub async fn read_all(&self) -> Result<Vec<Value>, Error> {
        let usuarios = self.repository.all().await?;
        Ok(usuarios.iter().map(format_usuario).collect())
    }

    pub async fn read(&self, id: &str) -> Result<Value, Error> {
        rules::USUARIO_READ.validate(&with_id(&Record::new(), "id_usuario", id))?;

        self.repository
            .find(to_int(&Value::from(id)))
            .await?
            .map(|usuario| format_usuario(&usuario))
            .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))
    }

    /// Create a user and return its id.
    pub async fn create(&self, data: Record) -> Result<u64, Error> {
        rules::USUARIO_CREATE.validate(&data)?;

        if let Some(email) = data.get("email").map(text)
            && self.repository.find_by_email(&email).await?.is_some()
        {
            return Err(Error::validation("email", EMAIL_TAKEN));
        }

        let id = self.repository.create(data).await?;
        info!(id, "Usuario creado");
        Ok(id)
    }

    /// Update a user and return its new public shape.
    ///
    /// `Replace` writes exactly what was sent; `Merge` layers it over the
    /// stored row. The stored password is kept unless a new one is sent.
    pub async fn update(&self, id: &str, data: Record, mode: UpdateMode) -> Result<Value, Error> {
        let id_num = to_int(&Value::from(id));
        let mut existente = self
            .repository
            .find(id_num)
            .await?
            .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))?;

        if data.is_empty() {
            return Err(AppError::invalid_operation("No se proporcionaron datos para actualizar").into());
        }

        rules::USUARIO_UPDATE.validate(&with_id(&data, "id_usuario", id))?;

        let email_actual = existente.get("email").map(text).unwrap_or_default();
        if let Some(email) = data.get("email").map(text)
            && email != email_actual
            && self.repository.find_by_email(&email).await?.is_some()
        {
            return Err(Error::validation("email", EMAIL_TAKEN));
        }

        if !data.contains_key("password") {
            existente.remove("password");
        }

        let to_update = match mode {
            UpdateMode::Replace => data,
            UpdateMode::Merge => merge(&existente, &data),
        };

        self.repository.update(id_num, to_update.clone()).await?;
        self.forget(&email_actual).await;
        info!(id = id_num, "Usuario actualizado");

        Ok(format_usuario(&to_update))
    }

    /// Soft delete: the user is marked `inactivo`.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        rules::USUARIO_DELETE.validate(&with_id(&Record::new(), "id_usuario", id))?;

        let id_num = to_int(&Value::from(id));
        let usuario = self
            .repository
            .find(id_num)
            .await?
            .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))?;

        let mut data = Record::new();
        data.insert("status".to_string(), Value::from("inactivo"));
        self.repository.update(id_num, data).await?;

        if let Some(email) = usuario.get("email").map(text) {
            self.forget(&email).await;
        }
        info!(id = id_num, "Usuario marcado como inactivo");
        Ok(())
    }

    /// Drop the login cache entry so status and password changes apply at once.
    async fn forget(&self, email: &str) {
        if email.is_empty() {
            return;
        }
        if let Err(e) = self.cache.delete(&user_cache_key(email)).await {
            warn!(%email, error = %e, "Error al invalidar la caché");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_usuario_hides_password() {
        let row = json!({
            "id_usuario": "3",
            "cedula": "1020",
            "nombre": "Ana",
            "email": "ana@tienda.co",
            "password": "$2y$10$abc",
            "status": "activo",
            "created_at": "2024-01-05 08:00:00",
            "columna_extra": 1
        });

        assert_eq!(
            format_usuario(row.as_object().unwrap()),
            json!({
                "id_usuario": 3,
                "cedula": 1020,
                "nombre": "Ana",
                "email": "ana@tienda.co",
                "status": "activo",
                "created_at": "05-01-2024"
            })
        );
    }
}
