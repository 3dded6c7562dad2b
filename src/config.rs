use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// JSON file holding the discovered sites list
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub log_to_file: bool,

    #[serde(default = "default_log_file")]
    pub log_file: String,

    #[serde(default)]
    pub json_format: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|_| ConfigError::NotFound(path.as_ref().display().to_string()))?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load the config at `path`, or the default location when `path` is
    /// `None`. A missing default file yields the built-in defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_with_env(path),
            None => {
                let default_path = Self::config_dir()?.join("config.toml");
                if default_path.exists() {
                    Self::load_with_env(default_path)
                } else {
                    let mut config = Self::default();
                    config.apply_env_overrides();
                    Ok(config)
                }
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("Storage path cannot be empty".to_string()));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("Log level cannot be empty".to_string()));
        }

        if self.logging.log_to_file && self.logging.log_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Log file must be set when log_to_file is enabled".to_string(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("NEWSLETTER_FINDER_STORE") {
            if !path.is_empty() {
                self.storage.path = PathBuf::from(path);
            }
        }

        if let Ok(level) = std::env::var("NEWSLETTER_FINDER_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn default() -> Self {
        Self {
            storage: StorageSettings::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("newsletter-finder"))
            .ok_or_else(|| ConfigError::Config("Could not determine config directory".to_string()))
    }

    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("newsletter-finder"))
            .ok_or_else(|| ConfigError::Config("Could not determine data directory".to_string()))
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_file: false,
            log_file: default_log_file(),
            json_format: false,
        }
    }
}

fn default_store_path() -> PathBuf {
    Config::data_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("sites.json")
}

fn default_log_level() -> String { "warn".to_string() }
fn default_log_file() -> String { "newsletter-finder.log".to_string() }
