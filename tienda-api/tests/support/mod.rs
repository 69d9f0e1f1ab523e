// In-memory repositories and a fully wired router for API tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;
use tienda_api::repositories::{
    ClienteRepository, UsuarioRepository, VentaRepository, hash_password_field,
};
use tienda_api::transform::{Record, merge, text};
use tienda_api::{HashAlgorithm, PasswordHasher, build_router, providers};
use zocalo_cache::{CacheStore, FileCache};
use zocalo_core::{Container, Error, HttpRequest, Router};
use zocalo_jwt::{JwtConfig, JwtService};

pub const SECRET: &str = "clave-de-pruebas";

pub fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

#[derive(Default)]
struct Table {
    rows: BTreeMap<i64, Record>,
    next_id: i64,
}

impl Table {
    fn insert(&mut self, key: &str, mut row: Record) -> u64 {
        self.next_id += 1;
        row.insert(key.to_string(), json!(self.next_id));
        row.insert("created_at".to_string(), json!("2024-05-01 10:00:00"));
        self.rows.insert(self.next_id, row);
        self.next_id as u64
    }

    fn patch(&mut self, id: i64, data: &Record) -> u64 {
        match self.rows.get_mut(&id) {
            Some(row) => {
                *row = merge(row, data);
                1
            }
            None => 0,
        }
    }

    fn find_by(&self, column: &str, value: &str) -> Option<Record> {
        self.rows
            .values()
            .find(|row| row.get(column).map(text).as_deref() == Some(value))
            .cloned()
    }
}

pub struct MemoryUsuarios {
    table: Mutex<Table>,
    hasher: PasswordHasher,
}

impl MemoryUsuarios {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            hasher,
        }
    }

    pub fn row(&self, id: i64) -> Option<Record> {
        self.table.lock().rows.get(&id).cloned()
    }
}

#[async_trait]
impl UsuarioRepository for MemoryUsuarios {
    async fn all(&self) -> Result<Vec<Record>, Error> {
        Ok(self.table.lock().rows.values().cloned().collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Record>, Error> {
        Ok(self.row(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Record>, Error> {
        Ok(self.table.lock().find_by("email", email))
    }

    async fn create(&self, mut data: Record) -> Result<u64, Error> {
        hash_password_field(&self.hasher, &mut data)?;
        Ok(self.table.lock().insert("id_usuario", data))
    }

    async fn update(&self, id: i64, mut data: Record) -> Result<u64, Error> {
        hash_password_field(&self.hasher, &mut data)?;
        Ok(self.table.lock().patch(id, &data))
    }
}

#[derive(Default)]
pub struct MemoryClientes {
    table: Mutex<Table>,
}

impl MemoryClientes {
    pub fn row(&self, id: i64) -> Option<Record> {
        self.table.lock().rows.get(&id).cloned()
    }
}

#[async_trait]
impl ClienteRepository for MemoryClientes {
    async fn all(&self) -> Result<Vec<Record>, Error> {
        Ok(self.table.lock().rows.values().cloned().collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Record>, Error> {
        Ok(self.row(id))
    }

    async fn find_by_cedula(&self, cedula: &str) -> Result<Option<Record>, Error> {
        Ok(self.table.lock().find_by("cedula", cedula))
    }

    async fn create(&self, data: Record) -> Result<u64, Error> {
        Ok(self.table.lock().insert("id_cliente", data))
    }

    async fn search(&self, criteria: &Record) -> Result<Vec<Record>, Error> {
        let table = self.table.lock();
        Ok(table
            .rows
            .values()
            .filter(|row| {
                criteria.iter().all(|(column, wanted)| {
                    let have = row.get(column).map(text).unwrap_or_default();
                    have.contains(text(wanted).trim())
                })
            })
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, data: Record) -> Result<u64, Error> {
        Ok(self.table.lock().patch(id, &data))
    }
}

#[derive(Default)]
pub struct MemoryVentas {
    table: Mutex<Table>,
    pagos: Mutex<Vec<Record>>,
}

impl MemoryVentas {
    pub fn row(&self, id: i64) -> Option<Record> {
        self.table.lock().rows.get(&id).cloned()
    }

    pub fn seed(&self, data: Value) -> i64 {
        self.table.lock().insert("id_venta", record(data)) as i64
    }

    pub fn add_pago(&self, id_venta: i64) {
        self.pagos
            .lock()
            .push(record(json!({ "id_venta": id_venta, "valor": "5000.00" })));
    }
}

#[async_trait]
impl VentaRepository for MemoryVentas {
    async fn all(&self) -> Result<Vec<Record>, Error> {
        Ok(self.table.lock().rows.values().cloned().collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Record>, Error> {
        Ok(self.row(id))
    }

    async fn create(&self, data: Record) -> Result<u64, Error> {
        Ok(self.table.lock().insert("id_venta", data))
    }

    async fn update(&self, id: i64, data: Record) -> Result<u64, Error> {
        Ok(self.table.lock().patch(id, &data))
    }

    async fn delete(&self, id: i64) -> Result<u64, Error> {
        Ok(self.table.lock().rows.remove(&id).map_or(0, |_| 1))
    }

    async fn pagos_by_venta(&self, id: i64) -> Result<Vec<Record>, Error> {
        Ok(self
            .pagos
            .lock()
            .iter()
            .filter(|p| p.get("id_venta") == Some(&json!(id)))
            .cloned()
            .collect())
    }
}

pub struct TestApp {
    pub router: Router,
    pub usuarios: Arc<MemoryUsuarios>,
    pub clientes: Arc<MemoryClientes>,
    pub ventas: Arc<MemoryVentas>,
    pub cache: Arc<FileCache>,
    pub jwt: JwtService,
    _cache_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let cache_dir = TempDir::new().unwrap();
        let cache = Arc::new(FileCache::new(cache_dir.path()).await.unwrap());
        let hasher = PasswordHasher::new(HashAlgorithm::Bcrypt).with_bcrypt_cost(4);

        let usuarios = Arc::new(MemoryUsuarios::new(hasher.clone()));
        let clientes = Arc::new(MemoryClientes::default());
        let ventas = Arc::new(MemoryVentas::default());

        let container = Container::new();
        providers::register_infrastructure(
            &container,
            cache.clone() as Arc<dyn CacheStore>,
            JwtConfig::new(SECRET),
            hasher,
        );
        container.instance(usuarios.clone() as Arc<dyn UsuarioRepository>);
        container.instance(clientes.clone() as Arc<dyn ClienteRepository>);
        container.instance(ventas.clone() as Arc<dyn VentaRepository>);
        providers::register_services(&container);

        let router = build_router(&container, "", false).unwrap();

        Self {
            router,
            usuarios,
            clientes,
            ventas,
            cache,
            jwt: JwtService::new(JwtConfig::new(SECRET)).unwrap(),
            _cache_dir: cache_dir,
        }
    }

    /// Insert an active user with password `secreto123`.
    pub async fn seed_usuario(&self, email: &str, status: &str) -> i64 {
        self.usuarios
            .create(record(json!({
                "cedula": "1020304050",
                "nombre": "Ana",
                "apellidos": "Gómez",
                "email": email,
                "password": "secreto123",
                "role": "admin",
                "status": status
            })))
            .await
            .unwrap() as i64
    }

    pub fn token(&self) -> String {
        self.jwt.generate_token(json!({ "id": 1 })).unwrap()
    }

    fn authorize(&self, req: HttpRequest) -> HttpRequest {
        req.with_header("Authorization", format!("Bearer {}", self.token()))
    }

    pub fn get(&self, path: &str) -> HttpRequest {
        self.authorize(HttpRequest::new("GET".into(), path.into()))
    }

    pub fn delete(&self, path: &str) -> HttpRequest {
        self.authorize(HttpRequest::new("DELETE".into(), path.into()))
    }

    pub fn send_json(&self, method: &str, path: &str, body: Value) -> HttpRequest {
        self.authorize(HttpRequest::new(method.into(), path.into()).with_json(body))
    }

    /// Dispatch and return status and parsed body.
    pub async fn call(&self, req: HttpRequest) -> (u16, Value) {
        let response = self.router.handle(req).await;
        (response.status, response.body_json().unwrap_or(Value::Null))
    }
}
