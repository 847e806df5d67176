//! Service configuration.
//!
//! Loaded from an optional TOML file; the daemon layers CLI flags and
//! environment variables on top. Every section has defaults so an empty
//! file (or no file) yields a working local setup.
//!
//! ```toml
//! [store]
//! host = "postgres"
//! password = "postgres_password"
//!
//! [cache]
//! host = "redis"
//!
//! [startup]
//! retry_attempts = 10
//! retry_delay_ms = 2000
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub startup: StartupConfig,
    pub server: ServerConfig,
}

/// Durable store connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Bound on acquiring a connection, including establishing a new one.
    pub connect_timeout_ms: u64,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "postgres".to_string(),
            connect_timeout_ms: 10_000,
            max_connections: 10,
        }
    }
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Cache and notification channel settings (both live on the same server).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    /// Per-command timeout for cache reads/writes and publishes.
    pub timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            timeout_ms: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Startup gate retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 10,
            retry_delay_ms: 2000,
        }
    }
}

impl StartupConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 5000)),
        }
    }
}

impl ServiceConfig {
    /// Parse a TOML config file. Missing sections and fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ServiceConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.startup.retry_attempts == 0 {
            return Err(ConfigError::Invalid(
                "startup.retry_attempts must be at least 1".to_string(),
            ));
        }
        if self.store.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "store.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = ServiceConfig::default();
        assert_eq!(config.startup.retry_attempts, 10);
        assert_eq!(config.startup.retry_delay(), Duration::from_secs(2));
        assert_eq!(config.store.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.cache.url(), "redis://localhost:6379/");
        assert_eq!(config.server.listen.port(), 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[store]\nhost = \"postgres\"\npassword = \"secret\"\n\n[startup]\nretry_attempts = 3"
        )
        .unwrap();

        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.store.host, "postgres");
        assert_eq!(config.store.password, "secret");
        assert_eq!(config.store.port, 5432);
        assert_eq!(config.startup.retry_attempts, 3);
        assert_eq!(config.startup.retry_delay_ms, 2000);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store\nhost = ").unwrap();
        assert!(matches!(
            ServiceConfig::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let result = ServiceConfig::from_file(Path::new("/nonexistent/valued.toml"));
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }

    #[test]
    fn zero_retry_attempts_rejected() {
        let mut config = ServiceConfig::default();
        config.startup.retry_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
