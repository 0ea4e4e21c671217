//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings. It is
//! loaded from a TOML file; `ODDSMITH_DATABASE` in the environment (or a
//! `.env` file) overrides the database location.
//!
//! # Example
//!
//! ```no_run
//! use oddsmith::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("oddsmith.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::economics::{EconomicsConfig, MarketPolicyConfig};
use super::logging::LoggingConfig;
use crate::application::Economics;
use crate::error::{ConfigError, Result};

/// Environment variable overriding [`Config::database`].
pub const DATABASE_ENV: &str = "ODDSMITH_DATABASE";

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "oddsmith.toml";

/// Where market data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// Process-local store; nothing survives exit.
    Memory,
    /// SQLite database file.
    Sqlite(String),
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// SQLite file path, or `memory`.
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub economics: EconomicsConfig,

    #[serde(default)]
    pub market_policy: MarketPolicyConfig,
}

fn default_database() -> String {
    "oddsmith.db".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            logging: LoggingConfig::default(),
            economics: EconomicsConfig::default(),
            market_policy: MarketPolicyConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML content, apply environment overrides
    /// and validate.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_overrides(std::env::var(DATABASE_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load `path` if it exists, otherwise start from defaults.
    #[allow(clippy::result_large_err)]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load(path);
        }
        Self::parse_toml("")
    }

    fn apply_overrides(&mut self, database: Option<String>) {
        if let Some(database) = database.filter(|d| !d.trim().is_empty()) {
            self.database = database;
        }
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }
        self.logging.validate()?;
        self.economics()?;
        Ok(())
    }

    /// The economic parameters the services run with.
    pub fn economics(&self) -> Result<Economics> {
        self.economics.to_economics(&self.market_policy)
    }

    #[must_use]
    pub fn database_target(&self) -> DatabaseTarget {
        match self.database.trim() {
            "memory" | ":memory:" => DatabaseTarget::Memory,
            path => DatabaseTarget::Sqlite(path.to_string()),
        }
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::InvalidValue {
                field: "config",
                reason: e.to_string(),
            }
            .into()
        })
    }
}
