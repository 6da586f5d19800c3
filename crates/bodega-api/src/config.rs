//! # Application Configuration
//!
//! Loaded from environment variables with fallback to defaults.
//!
//! ## Environment Variables
//! ```text
//! BODEGA_STORE_NAME           store name shown by the driver   default: Bodega
//! BODEGA_LOG                  tracing filter                   default: info,bodega=debug,sqlx=warn
//! BODEGA_DB_PATH              SQLite file                      default: bodega.db
//! BODEGA_DB_MAX_CONNECTIONS   pool size                        default: 5
//! ```

use bodega_db::DbConfig;
use std::env;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,bodega=debug,sqlx=warn";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Store name
    pub store_name: String,

    /// `tracing` filter directive
    pub log_filter: String,

    /// Database settings
    pub db: DbConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            store_name: "Bodega".to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            db: DbConfig::new("bodega.db"),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let db = DbConfig::from_env()
            .map_err(|_| ConfigError::InvalidValue("BODEGA_DB_MAX_CONNECTIONS".to_string()))?;

        let log_filter = env::var("BODEGA_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        EnvFilter::try_new(&log_filter)
            .map_err(|_| ConfigError::InvalidValue("BODEGA_LOG".to_string()))?;

        Ok(AppConfig {
            store_name: env::var("BODEGA_STORE_NAME").unwrap_or_else(|_| "Bodega".to_string()),
            log_filter,
            db,
        })
    }

    /// Installs the global tracing subscriber. Logs go to stderr.
    pub fn init_tracing(&self) {
        let filter =
            EnvFilter::try_new(&self.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
