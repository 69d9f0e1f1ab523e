//! Connection settings.

use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::time::Duration;

/// MySQL connection settings.
///
/// `timeout` bounds both acquiring a pooled connection and every single
/// statement run through [`Db`](crate::Db).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub database: String,
    pub port: u16,
    pub charset: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub timeout: Duration,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            database: String::new(),
            port: 3306,
            charset: "utf8mb4".to_string(),
            username: "root".to_string(),
            password: String::new(),
            timeout: Duration::from_secs(10),
            max_connections: 10,
        }
    }
}

impl DbConfig {
    pub fn new(host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .charset(&self.charset);

        if !self.database.is_empty() {
            options = options.database(&self.database);
        }
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }

        options
    }

    pub fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.max_connections.max(1))
            .acquire_timeout(self.timeout)
            .idle_timeout(Duration::from_secs(600))
    }

    /// Connection string with the password masked, for logs.
    pub fn display_url(&self) -> String {
        format!(
            "mysql://{}:****@{}:{}/{}?charset={}",
            self.username, self.host, self.port, self.database, self.charset
        )
    }
}
