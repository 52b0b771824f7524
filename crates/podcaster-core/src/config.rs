//! Application configuration.
//!
//! Configuration is read from environment variables. Binaries call
//! `dotenvy::dotenv()` first so a local `.env` file can supply them.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/podcaster` |
//! | `PODCASTER_DB_MAX_CONNECTIONS` | 10 |
//! | `PODCASTER_DB_MIN_CONNECTIONS` | 1 |
//! | `PODCASTER_DB_CONNECT_TIMEOUT_SECS` | 30 |
//! | `PODCASTER_DB_IDLE_TIMEOUT_SECS` | 600 |
//! | `PODCASTER_DB_MAX_LIFETIME_SECS` | 1800 (0 disables) |
//! | `PODCASTER_CATEGORY_REJECT_CYCLES` | false |
//! | `PODCASTER_CATEGORY_MAX_DEPTH` | 64 |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// `None` keeps connections for the lifetime of the pool.
    pub max_lifetime_secs: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DATABASE_URL.to_string(),
            max_connections: defaults::DB_MAX_CONNECTIONS,
            min_connections: defaults::DB_MIN_CONNECTIONS,
            connect_timeout_secs: defaults::DB_CONNECT_TIMEOUT_SECS,
            idle_timeout_secs: defaults::DB_IDLE_TIMEOUT_SECS,
            max_lifetime_secs: Some(defaults::DB_MAX_LIFETIME_SECS),
        }
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Option<Duration> {
        self.max_lifetime_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.url.is_empty() {
            return Err(ConfigError::Validation(
                "DATABASE_URL cannot be empty".to_string(),
            ));
        }
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ConfigError::Validation(format!(
                "DATABASE_URL must start with postgres:// or postgresql://, got: {}",
                self.url
            )));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Validation(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Validation(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}

/// Category hierarchy behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Reject parent updates that would close a cycle. Off by default:
    /// the stored hierarchy is otherwise unchecked. Checked re-parents are
    /// serialized per `CategoryHierarchy` (and its clones), not across
    /// processes.
    pub reject_cycles: bool,
    /// Upper bound on ancestors visited per walk.
    pub max_depth: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            reject_cycles: defaults::CATEGORY_REJECT_CYCLES,
            max_depth: defaults::CATEGORY_MAX_DEPTH,
        }
    }
}

impl HierarchyConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_depth == 0 {
            return Err(ConfigError::Validation(
                "category max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub hierarchy: HierarchyConfig,
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> ConfigResult<T> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(default),
    }
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> ConfigResult<bool> {
    match lookup(key) {
        Some(value) => match value.trim().to_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value }),
        },
        None => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let base = DatabaseConfig::default();
        let max_lifetime =
            parse_var(&lookup, "PODCASTER_DB_MAX_LIFETIME_SECS", defaults::DB_MAX_LIFETIME_SECS)?;

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(base.url),
            max_connections: parse_var(
                &lookup,
                "PODCASTER_DB_MAX_CONNECTIONS",
                base.max_connections,
            )?,
            min_connections: parse_var(
                &lookup,
                "PODCASTER_DB_MIN_CONNECTIONS",
                base.min_connections,
            )?,
            connect_timeout_secs: parse_var(
                &lookup,
                "PODCASTER_DB_CONNECT_TIMEOUT_SECS",
                base.connect_timeout_secs,
            )?,
            idle_timeout_secs: parse_var(
                &lookup,
                "PODCASTER_DB_IDLE_TIMEOUT_SECS",
                base.idle_timeout_secs,
            )?,
            max_lifetime_secs: (max_lifetime > 0).then_some(max_lifetime),
        };

        let hierarchy = HierarchyConfig {
            reject_cycles: parse_bool(
                &lookup,
                "PODCASTER_CATEGORY_REJECT_CYCLES",
                defaults::CATEGORY_REJECT_CYCLES,
            )?,
            max_depth: parse_var(
                &lookup,
                "PODCASTER_CATEGORY_MAX_DEPTH",
                defaults::CATEGORY_MAX_DEPTH,
            )?,
        };

        let config = Self {
            database,
            hierarchy,
        };
        config.validate()?;

        debug!(
            subsystem = "core",
            component = "config",
            max_connections = config.database.max_connections,
            reject_cycles = config.hierarchy.reject_cycles,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.database.validate()?;
        self.hierarchy.validate()
    }
}
