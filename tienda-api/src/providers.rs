//! Container wiring.
//!
//! Infrastructure (database, cache, JWT, password hashing) is registered
//! first; services and controllers resolve it lazily. Tests swap the
//! repository bindings for in-memory ones and reuse [`register_services`].

use crate::controllers::{AuthController, ClientesController, UsuariosController, VentasController};
use crate::password::PasswordHasher;
use crate::repositories::{
    ClienteRepository, MysqlClienteRepository, MysqlUsuarioRepository, MysqlVentaRepository,
    UsuarioRepository, VentaRepository,
};
use crate::services::{AuthService, ClienteService, UsuarioService, VentaService};
use std::sync::Arc;
use std::time::Duration;
use zocalo_cache::CacheStore;
use zocalo_config::AppConfig;
use zocalo_core::{Container, Error};
use zocalo_database::{Db, DbConfig};
use zocalo_jwt::{JwtConfig, JwtService};

/// Resolve a binding registered as `Arc<T>`, typically a trait object.
pub fn shared<T>(container: &Container) -> Result<Arc<T>, Error>
where
    T: ?Sized + Send + Sync + 'static,
{
    container.resolve::<Arc<T>>().map(|inner| Arc::clone(&*inner))
}

pub fn db_config(config: &AppConfig) -> DbConfig {
    let db = &config.database;
    DbConfig::new(&db.host, &db.database)
        .with_port(db.port)
        .with_charset(&db.charset)
        .with_credentials(&db.username, &db.password)
        .with_timeout(Duration::from_secs(db.timeout_secs))
}

pub fn jwt_config(config: &AppConfig) -> JwtConfig {
    JwtConfig::new(config.jwt.secret.clone())
        .with_expiration(Duration::from_secs(config.jwt.expiration))
}

/// Cache, JWT and password hashing.
pub fn register_infrastructure(
    container: &Container,
    cache: Arc<dyn CacheStore>,
    jwt: JwtConfig,
    hasher: PasswordHasher,
) {
    container.instance::<Arc<dyn CacheStore>>(cache);
    container.singleton(move |_| JwtService::new(jwt.clone()).map_err(Error::from));
    container.instance(hasher);
}

/// MySQL-backed repositories sharing one lazily connected pool.
pub fn register_mysql(container: &Container, config: DbConfig) {
    container.singleton(move |_| Ok(Db::connect_lazy(&config)));

    container.singleton::<Arc<dyn UsuarioRepository>, _>(|c| {
        let db = c.resolve::<Db>()?;
        let hasher = c.resolve::<PasswordHasher>()?;
        Ok(Arc::new(MysqlUsuarioRepository::new(
            db.as_ref().clone(),
            hasher.as_ref().clone(),
        )) as Arc<dyn UsuarioRepository>)
    });
    container.singleton::<Arc<dyn ClienteRepository>, _>(|c| {
        let db = c.resolve::<Db>()?;
        Ok(Arc::new(MysqlClienteRepository::new(db.as_ref().clone())) as Arc<dyn ClienteRepository>)
    });
    container.singleton::<Arc<dyn VentaRepository>, _>(|c| {
        let db = c.resolve::<Db>()?;
        Ok(Arc::new(MysqlVentaRepository::new(db.as_ref().clone())) as Arc<dyn VentaRepository>)
    });
}

/// Services and controllers on top of whatever repositories are bound.
pub fn register_services(container: &Container) {
    container.singleton(|c| {
        Ok(AuthService::new(
            shared::<dyn UsuarioRepository>(c)?,
            c.resolve::<JwtService>()?,
            shared::<dyn CacheStore>(c)?,
            c.resolve::<PasswordHasher>()?.as_ref().clone(),
        ))
    });
    container.singleton(|c| {
        Ok(UsuarioService::new(
            shared::<dyn UsuarioRepository>(c)?,
            shared::<dyn CacheStore>(c)?,
        ))
    });
    container.singleton(|c| Ok(ClienteService::new(shared::<dyn ClienteRepository>(c)?)));
    container.singleton(|c| Ok(VentaService::new(shared::<dyn VentaRepository>(c)?)));

    container.singleton(|c| Ok(AuthController::new(c.resolve::<AuthService>()?)));
    container.singleton(|c| Ok(UsuariosController::new(c.resolve::<UsuarioService>()?)));
    container.singleton(|c| Ok(ClientesController::new(c.resolve::<ClienteService>()?)));
    container.singleton(|c| Ok(VentasController::new(c.resolve::<VentaService>()?)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_repository_is_reported() {
        let container = Container::new();
        register_services(&container);

        assert!(matches!(
            container.resolve::<ClienteService>(),
            Err(Error::ProviderNotFound(_))
        ));
    }

    trait Saludo: Send + Sync {
        fn texto(&self) -> &str;
    }

    struct Hola;

    impl Saludo for Hola {
        fn texto(&self) -> &str {
            "hola"
        }
    }

    #[test]
    fn test_shared_returns_the_bound_trait_object() {
        let container = Container::new();
        container.instance::<Arc<dyn Saludo>>(Arc::new(Hola));

        let first: Arc<dyn Saludo> = shared(&container).unwrap();
        let second = shared::<dyn Saludo>(&container).unwrap();

        assert_eq!(first.texto(), "hola");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_db_config_from_settings() {
        let manager = zocalo_config::ConfigManager::new();
        manager.set("database", "tienda").unwrap();
        manager.set("db_timeout_secs", "3").unwrap();
        let config = AppConfig::from_manager(&manager).unwrap();

        let db = db_config(&config);
        assert_eq!(db.database, "tienda");
        assert_eq!(db.timeout, Duration::from_secs(3));
        assert_eq!(db.port, 3306);
    }
}
