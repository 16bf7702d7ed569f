//! Configuration Module
//!
//! Handles loading the backend connection settings from environment variables.

use std::env;

/// Backend connection parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend host name
    pub host: String,
    /// Backend port
    pub port: u16,
    /// Bucket to open
    pub bucket: String,
    /// Bucket credential
    pub password: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `COUCHCACHE_HOST` - Backend host (default: localhost)
    /// - `COUCHCACHE_PORT` - Backend port (default: 8091)
    /// - `COUCHCACHE_BUCKET` - Bucket name (default: couchcache)
    /// - `COUCHCACHE_PASSWORD` - Bucket password (default: password)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("COUCHCACHE_HOST").unwrap_or(defaults.host),
            port: env::var("COUCHCACHE_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            bucket: env::var("COUCHCACHE_BUCKET").unwrap_or(defaults.bucket),
            password: env::var("COUCHCACHE_PASSWORD").unwrap_or(defaults.password),
        }
    }

    /// Returns the `host:port` address of the backend.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8091,
            bucket: "couchcache".to_string(),
            password: "password".to_string(),
        }
    }
}
