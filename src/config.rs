//! Layered configuration loading.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. User-level `~/.config/chronicle/config.toml`
//! 3. Project-level `./chronicle.toml`
//! 4. Environment variables (`CHRONICLE_*`, `__` separating sections, so
//!    `CHRONICLE_DATABASE__PATH` sets `database.path`)
//!
//! Command-line flags are applied on top by the binary.

use crate::task::adapters::sqlite::SqliteOptions;
use crate::task::services::{DEFAULT_HISTORY_LIMIT, DEFAULT_STATS_DAYS};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CHRONICLE_";

/// Project-level configuration file name.
pub const LOCAL_CONFIG_FILE: &str = "chronicle.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("configuration error: {0}")]
    Figment(#[source] Box<figment::Error>),

    /// A configuration field has an invalid value.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// Dotted field path.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path.
    pub path: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// Lock wait in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/chronicle.db".to_owned(),
            pool_size: 4,
            busy_timeout_ms: 5000,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_owned(),
        }
    }
}

/// Reporting settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Cap on the completed-task listing.
    pub history_limit: usize,
    /// Length of the trailing statistics window, in days.
    pub stats_days: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            stats_days: DEFAULT_STATS_DAYS,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChronicleConfig {
    /// Store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Reporting settings.
    #[serde(default)]
    pub report: ReportConfig,
}

impl ChronicleConfig {
    /// Loads and validates configuration from every source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source fails to parse or a value is
    /// out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Extracts and validates configuration from a prepared figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when extraction or validation fails.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the provider chain, including the user-level file when one
    /// exists.
    #[must_use]
    pub fn figment() -> Figment {
        Self::layered(Self::global_config_path())
    }

    /// Builds the provider chain with an explicit user-level file.
    #[must_use]
    pub fn layered(global_path: Option<PathBuf>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = global_path.filter(|path| path.exists()) {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Toml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chronicle").join("config.toml"))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path",
                reason: "must not be empty".to_owned(),
            });
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.pool_size",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.report.stats_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "report.stats_days",
                reason: "must be at least 1".to_owned(),
            });
        }
        self.server
            .addr
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::InvalidValue {
                field: "server.addr",
                reason: err.to_string(),
            })?;
        Ok(())
    }

    /// Returns the store options described by this configuration.
    #[must_use]
    pub fn sqlite_options(&self) -> SqliteOptions {
        SqliteOptions {
            path: self.database.path.clone().into(),
            pool_size: self.database.pool_size,
            busy_timeout: Duration::from_millis(self.database.busy_timeout_ms),
        }
    }
}
