//! Configuration management for LeafBridge
//!
//! This module handles loading, validation, and saving of the YAML
//! configuration used by the standalone binary, and defines the per-device
//! settings bundle that pairing produces.

use crate::error::{LeafBridgeError, Result};
use crate::vehicle::Credentials;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_true() -> bool {
    true
}

/// Settings captured at pairing time and stored with the device.
///
/// Immutable for the lifetime of a device; there is no settings-update flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSettings {
    pub username: String,
    pub password: String,
    /// Poll interval in seconds
    pub poll_interval: u64,
    pub region_code: String,
}

impl DeviceSettings {
    /// Credentials handed to the vehicle connector on every fresh session
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            region_code: self.region_code.clone(),
        }
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The single vehicle this process drives
    pub device: DeviceConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Directory the replay client reads captured payloads from
    pub replay_dir: String,

    /// Publish NaN/infinite numbers produced by coercion instead of skipping the write
    #[serde(default = "default_true")]
    pub publish_non_finite: bool,
}

/// Vehicle selection plus its settings bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Vehicle identification number; empty selects the first vehicle
    #[serde(default)]
    pub vin: String,

    #[serde(flatten)]
    pub settings: DeviceSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level
    pub console_level: Option<String>,

    /// Optional file-specific level
    pub file_level: Option<String>,

    /// Path to log file (or directory); empty disables file logging
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/leafbridge.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            poll_interval: 300,
            region_code: "NE".to_string(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vin: String::new(),
            settings: DeviceSettings::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            logging: LoggingConfig::default(),
            replay_dir: "replay".to_string(),
            publish_non_finite: true,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "leafbridge.yaml",
            "/data/leafbridge.yaml",
            "/etc/leafbridge/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let settings = &self.device.settings;
        if settings.username.is_empty() {
            return Err(LeafBridgeError::validation(
                "device.username",
                "Username cannot be empty",
            ));
        }

        if settings.password.is_empty() {
            return Err(LeafBridgeError::validation(
                "device.password",
                "Password cannot be empty",
            ));
        }

        if settings.region_code.is_empty() {
            return Err(LeafBridgeError::validation(
                "device.regionCode",
                "Region code cannot be empty",
            ));
        }

        if settings.poll_interval == 0 {
            return Err(LeafBridgeError::validation(
                "device.pollInterval",
                "Must be greater than 0",
            ));
        }

        if self.replay_dir.is_empty() {
            return Err(LeafBridgeError::validation(
                "replay_dir",
                "Replay directory cannot be empty",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
