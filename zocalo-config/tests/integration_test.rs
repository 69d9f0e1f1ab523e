//! Integration tests for zocalo-config

use std::io::Write;
use tempfile::NamedTempFile;
use zocalo_config::*;

#[test]
fn test_dotenv_file_into_app_config() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "# tienda\nAPP_ENV=production\nHOST=db.interna\nDATABASE=tienda\nPASSWORD=\"con espacios\"\nLOG_RETENTION_DAYS=14"
    )
    .unwrap();

    let manager = ConfigManager::new();
    manager
        .load_dotenv_file(file.path().to_str().unwrap())
        .unwrap();

    let config = AppConfig::from_manager(&manager).unwrap();
    assert!(config.is_production());
    assert_eq!(config.database.host, "db.interna");
    assert_eq!(config.database.database, "tienda");
    assert_eq!(config.database.password, "con espacios");
    assert_eq!(config.log.retention_days, 14);
}

#[test]
fn test_prefixed_dotenv_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "TIENDA_JWT_SECRET=abc\nOTHER=1").unwrap();

    let manager = ConfigManager::with_prefix("TIENDA".to_string());
    manager
        .load_dotenv_file(file.path().to_str().unwrap())
        .unwrap();

    assert_eq!(manager.get_string("jwt_secret").unwrap(), "abc");
    assert!(!manager.has("other"));
}

#[test]
fn test_missing_dotenv_file_is_an_error() {
    let manager = ConfigManager::new();
    let result = manager.load_dotenv_file("/nonexistent/zocalo/.env");
    assert!(matches!(result, Err(ConfigError::LoadError(_))));
}
