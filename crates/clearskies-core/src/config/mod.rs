//! Configuration management for ClearSkies.
//!
//! This module handles loading, saving, and managing ClearSkies
//! configuration.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/clearskies/config.toml` |
//! | macOS | `~/Library/Application Support/ClearSkies/config.toml` |
//! | Windows | `%APPDATA%\ClearSkies\config.toml` |
//!
//! ## Example
//!
//! ```rust,ignore
//! use clearskies_core::config::Config;
//!
//! let config = Config::load()?;
//! println!("Device name: {}", config.general.device_name);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration struct for ClearSkies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Network settings
    pub network: NetworkConfig,
    /// Protocol settings
    pub protocol: ProtocolConfig,
    /// Shares to synchronize
    pub shares: Vec<ShareConfig>,
}

/// General configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Display name announced in `identity` messages
    pub device_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            device_name: "ClearSkies Device".to_string(),
        }
    }
}

/// Network configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to listen on
    pub listen_address: String,
    /// Port to listen on
    pub listen_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            listen_port: 42000,
        }
    }
}

/// Protocol tuning options.
///
/// The wire protocol itself recovers from garbage locally and never
/// disconnects; how much garbage a connection tolerates before being torn
/// down is policy, set here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Garbage events tolerated per connection before disconnecting
    pub max_garbage_events: u32,
    /// Keep-alive interval requested via `ping`, in seconds
    pub ping_timeout_secs: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_garbage_events: 32,
            ping_timeout_secs: crate::message::DEFAULT_PING_TIMEOUT,
        }
    }
}

/// One share entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Human-readable share name
    pub name: String,
    /// Directory to synchronize
    pub path: PathBuf,
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Save configuration to the default location, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::ConfigError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path of the configuration file on this platform.
    ///
    /// # Errors
    ///
    /// Returns an error if no platform config directory can be determined.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("org", "ClearSkies", "clearskies")
            .ok_or_else(|| Error::ConfigError("no config directory available".to_string()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Validate cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value found.
    pub fn validate(&self) -> Result<()> {
        if self.network.listen_port == 0 {
            return Err(Error::InvalidConfig {
                key: "network.listen_port".to_string(),
                reason: "must be nonzero".to_string(),
            });
        }
        if self.protocol.ping_timeout_secs == 0 {
            return Err(Error::InvalidConfig {
                key: "protocol.ping_timeout_secs".to_string(),
                reason: "must be nonzero".to_string(),
            });
        }
        for share in &self.shares {
            if share.name.is_empty() {
                return Err(Error::InvalidConfig {
                    key: "shares.name".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}
