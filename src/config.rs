//! Configuration loaded from TOML, with defaults for every value.
//!
//! ```toml
//! [connection]
//! host = "cache.internal"
//! port = 6380
//! password = "s3cret"
//! database = 2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default read/write buffer size (8 KiB).
const DEFAULT_BUF_SIZE: usize = 8 * 1024;

/// Highest database index a store exposes by default.
const MAX_DATABASE: u8 = 15;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How to reach the backing store.
    pub connection: ConnectionConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config file {:?}: {}", path, e))
        })?;
        Self::parse_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()
    }
}

/// Settings for one connection to the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Password sent with AUTH on connect, if any.
    pub password: Option<String>,
    /// Database index selected on connect.
    pub database: u8,
    /// Initial read/write buffer capacity in bytes.
    pub buffer_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            database: 0,
            buffer_size: DEFAULT_BUF_SIZE,
        }
    }
}

impl ConnectionConfig {
    /// Defaults with the given host and port.
    pub fn from_addr(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// `host:port`, as passed to the socket layer.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Config("host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(Error::Config("port cannot be 0".to_string()));
        }
        if self.database > MAX_DATABASE {
            return Err(Error::Config(format!(
                "database index must be between 0 and {}",
                MAX_DATABASE
            )));
        }
        if self.buffer_size == 0 {
            return Err(Error::Config("buffer size cannot be 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.connection.host, "127.0.0.1");
        assert_eq!(config.connection.port, 6379);
        assert_eq!(config.connection.database, 0);
        assert_eq!(config.connection.buffer_size, 8 * 1024);
        assert!(config.connection.password.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_str() {
        let toml = r#"
[connection]
host = "10.0.0.5"
port = 6380
password = "hunter2"
database = 3
"#;
        let config = Config::parse_str(toml).unwrap();
        assert_eq!(config.connection.addr(), "10.0.0.5:6380");
        assert_eq!(config.connection.password.as_deref(), Some("hunter2"));
        assert_eq!(config.connection.database, 3);
        // unspecified values keep their defaults
        assert_eq!(config.connection.buffer_size, 8 * 1024);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Config::parse_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Config::parse_str("[connection]\nport = \"high\""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::parse_str("[connection]\nport = 70000"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        config.connection.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.connection.database = 16;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.connection.buffer_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.connection.host.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/rankset.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
