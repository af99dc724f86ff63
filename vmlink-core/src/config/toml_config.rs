//! TOML configuration file I/O
//!
//! Handles loading and saving toolkit configuration to/from TOML files
//! in the user's configuration directory.

use crate::config::{EndpointConfig, LoggingConfig, SdkConfig};
use crate::error::{ConfigError, VmlinkError};
use crate::session::reconnect::ReconnectPolicy;
use crate::types::EndpointKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Complete TOML configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Management controller settings
    #[serde(default)]
    pub controller: EndpointConfig,

    /// Virtualization server settings
    #[serde(default)]
    pub hypervisor: EndpointConfig,

    /// Reconnect policy
    #[serde(default)]
    pub reconnection: ReconnectPolicy,

    /// Operation log settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Remote adapter settings
    #[serde(default)]
    pub sdk: SdkConfig,
}

impl TomlConfig {
    /// Settings for one endpoint kind
    pub fn endpoint(&self, kind: EndpointKind) -> &EndpointConfig {
        match kind {
            EndpointKind::Controller => &self.controller,
            EndpointKind::Hypervisor => &self.hypervisor,
        }
    }

    /// Mutable settings for one endpoint kind
    pub fn endpoint_mut(&mut self, kind: EndpointKind) -> &mut EndpointConfig {
        match kind {
            EndpointKind::Controller => &mut self.controller,
            EndpointKind::Hypervisor => &mut self.hypervisor,
        }
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.reconnection
            .validate()
            .map_err(|e| ConfigError::ValidationError {
                message: format!("Invalid reconnection policy: {}", e),
            })?;
        self.sdk
            .validate()
            .map_err(|message| ConfigError::ValidationError { message })?;
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, VmlinkError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VmlinkError::Config(ConfigError::LoadFailed {
                path: path.to_string_lossy().to_string(),
            }),
            _ => VmlinkError::Config(ConfigError::IoError {
                message: format!("Failed to read config file: {}", e),
            }),
        })?;

        let config: TomlConfig = toml::from_str(&contents).map_err(|e| {
            VmlinkError::Config(ConfigError::ValidationError {
                message: format!("Failed to parse config file: {}", e),
            })
        })?;

        config.validate()?;

        info!(
            "Loaded configuration: min_ttl_minutes={}, max_interactive_attempts={}, non_interactive={}, console_level={}",
            config.reconnection.min_ttl_minutes,
            config.reconnection.max_interactive_attempts,
            config.reconnection.non_interactive,
            config.logging.console_level
        );

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), VmlinkError> {
        self.validate()?;

        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VmlinkError::Config(ConfigError::IoError {
                    message: format!("Failed to create config directory: {}", e),
                })
            })?;
        }

        std::fs::write(path, contents).map_err(|_e| {
            VmlinkError::Config(ConfigError::SaveFailed {
                path: path.to_string_lossy().to_string(),
            })
        })?;

        info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the default configuration directory
///
/// Returns ~/.config/vmlink, or VMLINK_CONFIG_DIR if set
pub fn get_config_dir() -> Result<PathBuf, VmlinkError> {
    if let Ok(config_dir) = std::env::var("VMLINK_CONFIG_DIR") {
        return Ok(PathBuf::from(config_dir));
    }

    let home = std::env::var("HOME").map_err(|_| {
        VmlinkError::Config(ConfigError::IoError {
            message: "HOME environment variable not set".to_string(),
        })
    })?;

    Ok(PathBuf::from(home).join(".config").join("vmlink"))
}

/// Get the default configuration file path
pub fn get_config_path() -> Result<PathBuf, VmlinkError> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from `path`, or defaults when the file does not exist
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<TomlConfig, VmlinkError> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("No configuration at {:?}, using defaults", path);
        return Ok(TomlConfig::default());
    }
    TomlConfig::from_file(path)
}

/// Save configuration to a specific TOML file
pub fn save_config_to_path<P: AsRef<Path>>(config: &TomlConfig, path: P) -> Result<(), VmlinkError> {
    config.to_file(path.as_ref())
}
