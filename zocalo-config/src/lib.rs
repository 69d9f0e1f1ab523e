// Configuration management for zocalo applications

pub mod app;
pub mod env;
pub mod error;
pub mod validation;

pub use app::{AppConfig, CacheSettings, DatabaseSettings, JwtSettings, LogSettings};
pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use validation::{ConfigValidator, Validate};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Main configuration manager
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<HashMap<String, Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(HashMap::new())),
            env_prefix: None,
        }
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: String) -> Self {
        Self {
            config: Arc::new(RwLock::new(HashMap::new())),
            env_prefix: Some(prefix),
        }
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        let env_vars = loader.load()?;

        let mut config = self.config.write();
        for (key, value) in env_vars {
            config.insert(key, Value::String(value));
        }

        Ok(())
    }

    /// Load a `.env` file into the process environment, then the environment.
    /// Without a path a missing `.env` is not an error.
    pub fn load_dotenv(&self, path: Option<&str>) -> Result<()> {
        if let Some(path) = path {
            dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
        } else {
            dotenvy::dotenv().ok();
        }
        self.load_env()
    }

    /// Read a `.env` file into this manager only, leaving the process
    /// environment untouched
    pub fn load_dotenv_file(&self, path: &str) -> Result<()> {
        let iter = dotenvy::from_path_iter(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
        let mut pairs = Vec::new();
        for item in iter {
            pairs.push(item.map_err(|e| ConfigError::LoadError(e.to_string()))?);
        }

        let vars = EnvLoader::new(self.env_prefix.clone()).filter(pairs);
        let mut config = self.config.write();
        for (key, value) in vars {
            config.insert(key, Value::String(value));
        }

        Ok(())
    }

    /// Set a configuration value
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        self.config.write().insert(key.to_lowercase(), json_value);

        Ok(())
    }

    /// Get a configuration value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let config = self.config.read();

        let value = config
            .get(&key.to_lowercase())
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        serde_json::from_value(value.clone())
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Get a configuration value with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Get a value parsed from its textual form, so `"8080"` from the
    /// environment and `8080` set programmatically both work
    pub fn get_parsed<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let config = self.config.read();
        let value = config
            .get(&key.to_lowercase())
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        let text = match value {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };

        text.parse::<T>().map_err(|e| ConfigError::ParseError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// Parsed value, or `default` when the key is absent. A present but
    /// malformed value is still an error.
    pub fn get_parsed_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_parsed(key) {
            Err(ConfigError::KeyNotFound(_)) => Ok(default),
            other => other,
        }
    }

    /// Get a string value
    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
    }

    /// Get an integer value
    pub fn get_int(&self, key: &str) -> Result<i64> {
        self.get_parsed(key)
    }

    /// Get a boolean value
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.get_parsed(key)
    }

    /// Check if a key exists
    pub fn has(&self, key: &str) -> bool {
        self.config.read().contains_key(&key.to_lowercase())
    }

    /// Get all configuration keys
    pub fn keys(&self) -> Vec<String> {
        self.config.read().keys().cloned().collect()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let manager = ConfigManager::new();
        manager.set("test_key", "test_value").unwrap();

        let value: String = manager.get("test_key").unwrap();
        assert_eq!(value, "test_value");
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let manager = ConfigManager::new();
        manager.set("JWT_SECRET", "s3cret").unwrap();

        assert!(manager.has("jwt_secret"));
        assert_eq!(manager.get_string("Jwt_Secret").unwrap(), "s3cret");
    }

    #[test]
    fn test_get_or_default() {
        let manager = ConfigManager::new();

        let value: String = manager.get_or("missing_key", "default_value".to_string());
        assert_eq!(value, "default_value");
    }

    #[test]
    fn test_parsed_values_from_strings() {
        let manager = ConfigManager::new();
        manager.set("app_port", "9090").unwrap();
        manager.set("expiration", 120).unwrap();
        manager.set("debug", " true ").unwrap();

        assert_eq!(manager.get_parsed::<u16>("app_port").unwrap(), 9090);
        assert_eq!(manager.get_int("expiration").unwrap(), 120);
        assert!(manager.get_bool("debug").unwrap());
    }

    #[test]
    fn test_parsed_or_default_only_when_missing() {
        let manager = ConfigManager::new();
        manager.set("port", "not-a-number").unwrap();

        assert_eq!(manager.get_parsed_or::<u16>("app_port", 8080).unwrap(), 8080);
        assert!(matches!(
            manager.get_parsed_or::<u16>("port", 3306),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
