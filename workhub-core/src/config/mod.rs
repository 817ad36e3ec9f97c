//! Configuration management
//!
//! Environment-based configuration with defaults and validation. Secrets are
//! read here once and handed to the components that need them; nothing else
//! reads ambient process state.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Default lifetime of an issued token
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Store configuration
    pub store: StoreConfig,

    /// Token issuance configuration
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Data directory for the SQLite database
    pub data_dir: PathBuf,
}

/// Token issuance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Process-wide signing secret
    pub jwt_secret: String,

    /// Lifetime of issued tokens
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables follow the pattern `WORKHUB_<SECTION>_<KEY>`, e.g.
    /// `WORKHUB_AUTH_JWT_SECRET=...`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(data_dir) = env::var("WORKHUB_STORE_DATA_DIR") {
            config.store.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(secret) = env::var("WORKHUB_AUTH_JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }
        if let Ok(ttl) = env::var("WORKHUB_AUTH_TOKEN_TTL") {
            config.auth.token_ttl = humantime_serde::re::humantime::parse_duration(&ttl)
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid token TTL: {}", e)))?;
        }

        if let Ok(level) = env::var("WORKHUB_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = env::var("WORKHUB_LOG_JSON") {
            config.logging.json_format = json
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid JSON flag: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }

        if self.auth.token_ttl.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "auth.token_ttl must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
