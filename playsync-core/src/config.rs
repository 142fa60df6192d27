//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/playsync/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/playsync/` (~/.config/playsync/)
//! - Data: `$XDG_DATA_HOME/playsync/` (~/.local/share/playsync/)
//! - State/Logs: `$XDG_STATE_HOME/playsync/` (~/.local/state/playsync/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the configuration side file inside the user-data directory.
pub const CONFIGURATIONS_FILE: &str = "Configurations.json";

/// File name of the activity database inside the user-data directory.
pub const DATABASE_FILE: &str = "activity.db";

/// Prefix of the daily log files (`playsync.YYYY-MM-DD.log`).
pub const LOG_FILE_PREFIX: &str = "playsync";

/// Suffix of the daily log files.
pub const LOG_FILE_SUFFIX: &str = "log";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Export/import behaviour
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Settings consumed by the export/import engine.
#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Configuration index used when an incoming record names no
    /// configuration and its index hint is out of range.
    #[serde(default)]
    pub default_configuration: i32,

    /// Action name given to sessions that arrive without one
    #[serde(default = "default_action_label")]
    pub default_action_label: String,

    /// Override for the user-data directory holding the activity database
    /// and the configuration list
    pub user_data_dir: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_configuration: 0,
            default_action_label: default_action_label(),
            user_data_dir: None,
        }
    }
}

fn default_action_label() -> String {
    "Activity".to_string()
}

impl SyncConfig {
    /// Directory holding the activity database and the configuration side file.
    pub fn user_data_path(&self) -> PathBuf {
        self.user_data_dir.clone().unwrap_or_else(Config::data_dir)
    }

    /// Full path of the configuration side file.
    pub fn configurations_path(&self) -> PathBuf {
        self.user_data_path().join(CONFIGURATIONS_FILE)
    }

    /// Full path of the activity database.
    pub fn database_path(&self) -> PathBuf {
        self.user_data_path().join(DATABASE_FILE)
    }
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/playsync/config.toml` (~/.config/playsync/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("playsync").join("config.toml")
    }

    /// Returns the data directory path (database and configuration list)
    ///
    /// `$XDG_DATA_HOME/playsync/` (~/.local/share/playsync/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("playsync")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/playsync/` (~/.local/state/playsync/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("playsync")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/playsync/activity.db` unless `sync.user_data_dir`
    /// moves it
    pub fn database_path(&self) -> PathBuf {
        self.sync.database_path()
    }

    /// Returns the path of today's log file
    ///
    /// `$XDG_STATE_HOME/playsync/playsync.YYYY-MM-DD.log` (dated in UTC, like
    /// the daily rotation)
    pub fn log_path() -> PathBuf {
        let date = chrono::Utc::now().format("%Y-%m-%d");
        Self::state_dir().join(format!("{}.{}.{}", LOG_FILE_PREFIX, date, LOG_FILE_SUFFIX))
    }
}
