use crate::password::PasswordHasher;
use crate::transform::{Record, only};
use async_trait::async_trait;
use serde_json::{Value, json};
use zocalo_core::Error;
use zocalo_database::{Db, DbResultExt};

const TABLE: &str = "usuarios";
const KEY: &str = "id_usuario";
const COLUMNS: &[&str] = &[
    "cedula",
    "nombre",
    "apellidos",
    "email",
    "password",
    "role",
    "status",
];

#[async_trait]
pub trait UsuarioRepository: Send + Sync {
    async fn all(&self) -> Result<Vec<Record>, Error>;

    async fn find(&self, id: i64) -> Result<Option<Record>, Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Record>, Error>;

    /// Insert a user and return its id. A plain `password` is hashed first.
    async fn create(&self, data: Record) -> Result<u64, Error>;

    /// Update the columns present in `data`. A `password` is re-hashed.
    async fn update(&self, id: i64, data: Record) -> Result<u64, Error>;
}

/// Replace a plain-text `password` entry with its hash.
pub fn hash_password_field(hasher: &PasswordHasher, data: &mut Record) -> Result<(), Error> {
    if let Some(Value::String(plain)) = data.get("password") {
        let hashed = hasher.hash(plain)?;
        data.insert("password".to_string(), Value::String(hashed));
    }
    Ok(())
}

pub struct MysqlUsuarioRepository {
    db: Db,
    hasher: PasswordHasher,
}

impl MysqlUsuarioRepository {
    pub fn new(db: Db, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }
}

#[async_trait]
impl UsuarioRepository for MysqlUsuarioRepository {
    async fn all(&self) -> Result<Vec<Record>, Error> {
        self.db
            .query("SELECT * FROM usuarios", &[])
            .await
            .db_context("Error al obtener los usuarios")
    }

    async fn find(&self, id: i64) -> Result<Option<Record>, Error> {
        self.db
            .query_row("SELECT * FROM usuarios WHERE id_usuario = ?", &[json!(id)])
            .await
            .db_context("Error al buscar el usuario")
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Record>, Error> {
        self.db
            .query_row("SELECT * FROM usuarios WHERE email = ?", &[json!(email)])
            .await
            .db_context("Error al buscar el usuario por email")
    }

    async fn create(&self, data: Record) -> Result<u64, Error> {
        let mut data = only(&data, COLUMNS);
        hash_password_field(&self.hasher, &mut data)?;

        self.db
            .save(TABLE, &data)
            .await
            .db_context("Error al crear el usuario")
    }

    async fn update(&self, id: i64, data: Record) -> Result<u64, Error> {
        let mut data = only(&data, COLUMNS);
        hash_password_field(&self.hasher, &mut data)?;
        data.insert(KEY.to_string(), json!(id));

        self.db
            .update_item(TABLE, KEY, &data)
            .await
            .db_context("Error al actualizar el usuario")
    }
}
