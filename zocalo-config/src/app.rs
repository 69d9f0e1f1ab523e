//! Typed application settings.
//!
//! [`AppConfig`] is a snapshot of a [`ConfigManager`] taken at startup. Keys
//! follow the environment variable names (`APP_ENV`, `JWT_SECRET`, ...),
//! lowercased.

use crate::{ConfigManager, ConfigValidator, Result, Validate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub host: String,
    pub database: String,
    pub port: u16,
    pub charset: String,
    pub username: String,
    pub password: String,
    /// Upper bound for a single statement, in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtSettings {
    pub secret: String,
    /// Access-token lifetime in seconds
    pub expiration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheSettings {
    pub directory: String,
    /// Enables encryption at rest when set
    pub encryption_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogSettings {
    pub directory: String,
    pub retention_days: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub app_env: String,
    pub base_path: String,
    pub port: u16,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub cache: CacheSettings,
    pub log: LogSettings,
}

impl AppConfig {
    /// Build the settings from `manager`, filling defaults for absent keys
    pub fn from_manager(manager: &ConfigManager) -> Result<Self> {
        let text = |key: &str, default: &str| -> String {
            manager
                .get_string(key)
                .unwrap_or_else(|_| default.to_string())
        };

        let encryption_key = manager
            .get_string("cache_encryption_key")
            .ok()
            .filter(|k| !k.is_empty());

        let config = Self {
            app_env: text("app_env", "development"),
            base_path: text("base_path", ""),
            port: manager.get_parsed_or("app_port", 8080)?,
            database: DatabaseSettings {
                host: text("host", "localhost"),
                database: text("database", "your_db"),
                port: manager.get_parsed_or("port", 3306)?,
                charset: text("charset", "utf8mb4"),
                username: text("username", "root"),
                password: text("password", ""),
                timeout_secs: manager.get_parsed_or("db_timeout_secs", 10)?,
            },
            jwt: JwtSettings {
                secret: text("jwt_secret", "default_secret_key"),
                expiration: manager.get_parsed_or("expiration", 3600)?,
            },
            cache: CacheSettings {
                directory: text("cache_dir", "./cache"),
                encryption_key,
            },
            log: LogSettings {
                directory: text("log_dir", "./logs"),
                retention_days: manager.get_parsed_or("log_retention_days", 7)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Load `.env` (when present) and the process environment
    pub fn from_env() -> Result<Self> {
        let manager = ConfigManager::new();
        manager.load_dotenv(None)?;
        Self::from_manager(&manager)
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        ConfigValidator::new()
            .port("APP_PORT", self.port)
            .port("PORT", self.database.port)
            .not_empty("HOST", &self.database.host)
            .not_empty("DATABASE", &self.database.database)
            .not_empty("JWT_SECRET", &self.jwt.secret)
            .in_range("EXPIRATION", self.jwt.expiration, 1, 60 * 60 * 24 * 30)
            .in_range("DB_TIMEOUT_SECS", self.database.timeout_secs, 1, 600)
            .not_empty("CACHE_DIR", &self.cache.directory)
            .not_empty("LOG_DIR", &self.log.directory)
            .finish()
    }
}
