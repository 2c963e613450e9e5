//! # Register Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TILLQUEST_DB_PATH=./shop.db                                        │
//! │     TILLQUEST_STORE_NAME="Lemonade Stand"                              │
//! │     TILLQUEST_WELCOME_CREDIT=50.00                                     │
//! │     TILLQUEST_CHANNEL_PATH=/shared/channel.db                          │
//! │     TILLQUEST_LOG=debug                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/tillquest/config.toml (Linux)                            │
//! │     ~/Library/Application Support/com.tillquest.tillquest/... (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! store_name = "Lemonade Stand"
//! database_path = "/home/kid/tillquest.db"
//! welcome_credit_cents = 10000
//! log_filter = "info,tillquest=debug,sqlx=warn"
//!
//! # Optional: a second database both registers can reach. Without it the
//! # payment channel lives in the shop database.
//! channel_path = "/shared/tillquest-channel.db"
//! ```
//!
//! ## Thread Safety
//! Configuration is read-only after startup, so no mutex is needed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use tillquest_core::{Money, MAX_AMOUNT};

/// Default log filter when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,tillquest=debug,sqlx=warn";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read or parsed.
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    /// A value is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

/// Register configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Shown in the prompt and on payment requests.
    pub store_name: String,

    /// SQLite file for the shop, or `:memory:`.
    pub database_path: PathBuf,

    /// SQLite file holding the payment channel. `None` uses the shop database.
    pub channel_path: Option<PathBuf>,

    /// Credit loaded into every new buyer wallet, in cents.
    /// Default: 10000 (100.00)
    pub welcome_credit_cents: i64,

    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            store_name: "TillQuest Shop".to_string(),
            database_path: default_database_path(),
            channel_path: None,
            welcome_credit_cents: 10_000,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = config_path.or_else(default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                config = AppConfig::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads config or returns the default if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        AppConfig::load(config_path).unwrap_or_else(|e| {
            warn!("{}. Using defaults.", e);
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            if config.validate().is_err() {
                config = AppConfig::default();
            }
            config
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_name.trim().is_empty() {
            return Err(ConfigError::Invalid("store_name must not be empty".into()));
        }
        if self.welcome_credit_cents < 0 {
            return Err(ConfigError::Invalid(
                "welcome_credit_cents must not be negative".into(),
            ));
        }
        if self.welcome_credit() > MAX_AMOUNT {
            return Err(ConfigError::Invalid(format!(
                "welcome_credit_cents must be at most {}",
                MAX_AMOUNT.cents()
            )));
        }
        Ok(())
    }

    pub fn welcome_credit(&self) -> Money {
        Money::from_cents(self.welcome_credit_cents)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("TILLQUEST_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("TILLQUEST_CHANNEL_PATH") {
            self.channel_path = Some(PathBuf::from(path));
        }

        if let Ok(name) = std::env::var("TILLQUEST_STORE_NAME") {
            self.store_name = name;
        }

        // Accepts "50.00" or "50".
        if let Ok(credit) = std::env::var("TILLQUEST_WELCOME_CREDIT") {
            match credit.parse::<Money>() {
                Ok(money) => self.welcome_credit_cents = money.cents(),
                Err(_) => warn!(value = %credit, "Ignoring unparseable TILLQUEST_WELCOME_CREDIT"),
            }
        }

        if let Ok(filter) = std::env::var("TILLQUEST_LOG") {
            self.log_filter = filter;
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "tillquest", "tillquest")
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Platform data directory, or the working directory if there is none.
fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("tillquest.db"))
        .unwrap_or_else(|| PathBuf::from("tillquest.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.welcome_credit(), Money::from_major(100));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(config.channel_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.store_name = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.welcome_credit_cents = -1;
        assert!(config.validate().is_err());

        config.welcome_credit_cents = MAX_AMOUNT.cents() + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            store_name = "Lemonade Stand"
            database_path = ":memory:"
            "#,
        )
        .unwrap();

        assert_eq!(config.store_name, "Lemonade Stand");
        assert_eq!(config.database_path, PathBuf::from(":memory:"));
        assert_eq!(config.welcome_credit_cents, 10_000);
    }

    #[test]
    fn test_bad_toml_is_a_load_error() {
        let err: ConfigError = toml::from_str::<AppConfig>("store_name = ")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConfigError::LoadFailed(_)));
    }
}
