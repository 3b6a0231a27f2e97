//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::dashboard::BroadcastConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Seconds between dashboard pushes
    pub dashboard_interval_secs: u64,

    /// Seconds to wait after a failed dashboard tick
    pub dashboard_error_backoff_secs: u64,

    /// Upper bound on one dashboard read
    pub dashboard_read_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let config = Self {
            database_url,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            host,
            port: parse_or("PORT", 3000)?,
            environment,
            dashboard_interval_secs: parse_or("DASHBOARD_INTERVAL_SECS", 10)?,
            dashboard_error_backoff_secs: parse_or("DASHBOARD_ERROR_BACKOFF_SECS", 5)?,
            dashboard_read_timeout_secs: parse_or("DASHBOARD_READ_TIMEOUT_SECS", 5)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the broadcast loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard_interval_secs == 0 {
            return Err(ConfigError::InvalidValue("DASHBOARD_INTERVAL_SECS"));
        }
        if self.dashboard_error_backoff_secs == 0 {
            return Err(ConfigError::InvalidValue("DASHBOARD_ERROR_BACKOFF_SECS"));
        }
        if self.dashboard_read_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("DASHBOARD_READ_TIMEOUT_SECS"));
        }
        Ok(())
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn broadcast_config(&self) -> BroadcastConfig {
        BroadcastConfig {
            interval: Duration::from_secs(self.dashboard_interval_secs),
            error_backoff: Duration::from_secs(self.dashboard_error_backoff_secs),
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.dashboard_read_timeout_secs)
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
