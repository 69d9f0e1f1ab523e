use std::net::SocketAddr;
use std::sync::Arc;
use tienda_api::providers;
use tienda_api::{PasswordHasher, build_router};
use zocalo_cache::{CacheStore, FileCache};
use zocalo_config::AppConfig;
use zocalo_core::{Application, Container};
use zocalo_log::{LogConfig, LogFormat, LogLevel, LogOutput, LogRetention, info, warn};

const LOG_PREFIX: &str = "app";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let _guard = LogConfig::new()
        .level(if config.is_production() {
            LogLevel::Info
        } else {
            LogLevel::Debug
        })
        .format(LogFormat::Bracketed)
        .output(LogOutput::DailyFile {
            directory: config.log.directory.clone(),
            prefix: LOG_PREFIX.to_string(),
        })
        .init()?;

    match LogRetention::new(&config.log.directory, LOG_PREFIX)
        .max_age_days(config.log.retention_days)
        .maybe_clean()
    {
        Ok(0) => {}
        Ok(removed) => info!(removed, "Old log files removed"),
        Err(e) => warn!(error = %e, "Log retention failed"),
    }

    let mut cache = FileCache::new(&config.cache.directory).await?;
    if let Some(key) = &config.cache.encryption_key {
        cache = cache.with_encryption(key)?;
    }
    let cache: Arc<dyn CacheStore> = Arc::new(cache);

    let container = Container::new();
    providers::register_infrastructure(
        &container,
        cache,
        providers::jwt_config(&config),
        PasswordHasher::default(),
    );
    providers::register_mysql(&container, providers::db_config(&config));
    providers::register_services(&container);

    let router = build_router(&container, &config.base_path, config.is_production())?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, env = %config.app_env, "Starting tienda-api");

    Application::new(container, router).listen(addr).await?;
    Ok(())
}
