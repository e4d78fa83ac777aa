//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally_db::DbConfig;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Listen address (`TALLY_HTTP_ADDR`, default `0.0.0.0:8080`)
    pub http_addr: SocketAddr,

    /// SQLite database file (`TALLY_DATABASE_PATH`, default `./tally.db`)
    pub database_path: PathBuf,

    /// Pool size (`TALLY_DB_MAX_CONNECTIONS`, default 8)
    pub db_max_connections: u32,

    /// Per-request timeout in seconds (`TALLY_REQUEST_TIMEOUT_SECS`, default 30)
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_path: PathBuf::from("./tally.db"),
            db_max_connections: 8,
            request_timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            http_addr: parse_or(&lookup, "TALLY_HTTP_ADDR", defaults.http_addr)?,

            database_path: lookup("TALLY_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            db_max_connections: parse_or(
                &lookup,
                "TALLY_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,

            request_timeout_secs: parse_or(
                &lookup,
                "TALLY_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("TALLY_DB_MAX_CONNECTIONS".to_string()));
        }
        if config.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("TALLY_REQUEST_TIMEOUT_SECS".to_string()));
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.db_max_connections)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.http_addr.port(), 8080);
        assert_eq!(config.db_max_connections, 8);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("TALLY_HTTP_ADDR", "127.0.0.1:9000"),
            ("TALLY_DATABASE_PATH", "/tmp/shop.db"),
            ("TALLY_DB_MAX_CONNECTIONS", "4"),
        ]))
        .unwrap();
        assert_eq!(config.http_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.database_path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.db_max_connections, 4);
    }

    #[test]
    fn test_invalid_values_are_named() {
        let err = ApiConfig::from_lookup(lookup(&[("TALLY_DB_MAX_CONNECTIONS", "many")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for TALLY_DB_MAX_CONNECTIONS");

        let err = ApiConfig::from_lookup(lookup(&[("TALLY_REQUEST_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key) if key == "TALLY_REQUEST_TIMEOUT_SECS"));
    }
}
