use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::database::DEFAULT_STORAGE_WORKERS;
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Upper bound on storage jobs running at once
    #[serde(default = "default_storage_workers")]
    pub storage_workers: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_seed_on_first_run")]
    pub seed_on_first_run: bool,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            storage_workers: default_storage_workers(),
            log_level: default_log_level(),
            seed_on_first_run: default_seed_on_first_run(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

// Default value functions
fn default_database_path() -> String {
    // Fallback only; load_with_profile resolves the path for the active profile
    if let Some(data_dir) = utils::get_data_dir(utils::Profile::Prod) {
        data_dir.join("organizer.db").to_string_lossy().to_string()
    } else {
        "~/.local/share/organizer/organizer.db".to_string()
    }
}

fn default_storage_workers() -> usize {
    DEFAULT_STORAGE_WORKERS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_seed_on_first_run() -> bool {
    true
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid config value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

impl Config {
    /// Load configuration from the profile's config directory, or create default if missing
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        let default_db = Self::default_database_path_for_profile(profile);
        Self::load_or_create(&config_path, default_db)
    }

    /// Load configuration from an explicit file, creating it with defaults if missing
    pub fn load_from(path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        Self::load_or_create(path, Self::default_database_path_for_profile(profile))
    }

    fn load_or_create(config_path: &Path, default_db: String) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let contents =
                fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;
            if config.database_path.trim().is_empty() {
                config.database_path = default_db;
            }
            config.validate()?;
            Ok(config)
        } else {
            let mut config = Config {
                database_path: default_db,
                ..Config::default()
            };
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "storage_workers",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to `config_path`, creating parent directories
    pub fn save_to(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("organizer.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/organizer-dev/organizer.db".to_string(),
                utils::Profile::Prod => "~/.local/share/organizer/organizer.db".to_string(),
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }
}
