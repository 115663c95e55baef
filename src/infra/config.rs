//! Configuration management infrastructure.
//!
//! This module provides configuration file support for the keybox location,
//! reader limits and logging preferences.

use crate::adapters::blob_reader::DEFAULT_MAX_BLOB_SIZE;
use crate::infra::error::{KeyboxError, KeyboxResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Log levels accepted by `log_level`.
const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace", "off"];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboxConfiguration {
    /// Keybox file searched by default
    pub keybox_path: PathBuf,

    /// Largest blob image accepted by the reader, in bytes
    pub max_blob_size: usize,

    /// Default log filter when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for KeyboxConfiguration {
    fn default() -> Self {
        Self {
            keybox_path: default_keybox_path(),
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
            log_level: "info".to_string(),
        }
    }
}

/// `$GNUPGHOME/pubring.kbx`, falling back to `~/.gnupg/pubring.kbx`.
fn default_keybox_path() -> PathBuf {
    if let Some(home) = std::env::var_os("GNUPGHOME") {
        return PathBuf::from(home).join("pubring.kbx");
    }
    dirs::home_dir()
        .map(|home| home.join(".gnupg"))
        .unwrap_or_else(|| PathBuf::from(".gnupg"))
        .join("pubring.kbx")
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> KeyboxResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> KeyboxResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("keybox-certcheck").join("config.toml"))
        } else {
            Ok(PathBuf::from("keybox-certcheck.toml"))
        }
    }

    /// Load configuration from file, falling back to defaults if it doesn't exist
    pub fn load_or_default(&self) -> KeyboxResult<KeyboxConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::debug!(
                "Configuration file not found, using defaults: {}",
                self.config_path.display()
            );
            Ok(KeyboxConfiguration::default())
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> KeyboxResult<KeyboxConfiguration> {
        log::debug!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            KeyboxError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: KeyboxConfiguration = toml::from_str(&content).map_err(|e| {
            KeyboxError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &KeyboxConfiguration) -> KeyboxResult<()> {
        validate_config(config)?;
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    KeyboxError::ConfigurationError(format!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            KeyboxError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            KeyboxError::ConfigurationError(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Update a specific configuration value
    pub fn update_value(&self, key: &str, value: &str) -> KeyboxResult<()> {
        let mut config = self.load_or_default()?;

        match key {
            "keybox_path" => {
                config.keybox_path = PathBuf::from(value);
            }
            "max_blob_size" => {
                config.max_blob_size = value.parse().map_err(|_| {
                    KeyboxError::ConfigurationError(format!("Invalid blob size: {value}"))
                })?;
            }
            "log_level" => {
                config.log_level = value.to_ascii_lowercase();
            }
            _ => {
                return Err(KeyboxError::ConfigurationError(format!(
                    "Unknown configuration key: {key}"
                )));
            }
        }

        self.save(&config)
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Export configuration as a portable format
    pub fn export_config(&self, format: ExportFormat) -> KeyboxResult<String> {
        let config = self.load_or_default()?;

        match format {
            ExportFormat::Toml => toml::to_string_pretty(&config)
                .map_err(|e| KeyboxError::ConfigurationError(format!("TOML export failed: {e}"))),
            ExportFormat::Json => serde_json::to_string_pretty(&config)
                .map_err(|e| KeyboxError::ConfigurationError(format!("JSON export failed: {e}"))),
            ExportFormat::Yaml => serde_yaml::to_string(&config)
                .map_err(|e| KeyboxError::ConfigurationError(format!("YAML export failed: {e}"))),
        }
    }

    /// Import configuration from a string
    pub fn import_config(&self, content: &str, format: ExportFormat) -> KeyboxResult<()> {
        let config: KeyboxConfiguration = match format {
            ExportFormat::Toml => toml::from_str(content).map_err(|e| {
                KeyboxError::ConfigurationError(format!("TOML import failed: {e}"))
            })?,
            ExportFormat::Json => serde_json::from_str(content).map_err(|e| {
                KeyboxError::ConfigurationError(format!("JSON import failed: {e}"))
            })?,
            ExportFormat::Yaml => serde_yaml::from_str(content).map_err(|e| {
                KeyboxError::ConfigurationError(format!("YAML import failed: {e}"))
            })?,
        };

        self.save(&config)
    }
}

/// Validate configuration values
fn validate_config(config: &KeyboxConfiguration) -> KeyboxResult<()> {
    if config.keybox_path.as_os_str().is_empty() {
        return Err(KeyboxError::ConfigurationError(
            "Keybox path must not be empty".to_string(),
        ));
    }

    // a blob must at least hold the 40-byte fixed header
    if config.max_blob_size < 40 {
        return Err(KeyboxError::ConfigurationError(format!(
            "Maximum blob size too small: {} (minimum 40)",
            config.max_blob_size
        )));
    }

    if !LOG_LEVELS.contains(&config.log_level.as_str()) {
        return Err(KeyboxError::ConfigurationError(format!(
            "Invalid log level: {}",
            config.log_level
        )));
    }

    Ok(())
}

/// Configuration export/import formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Toml,
    Json,
    Yaml,
}
