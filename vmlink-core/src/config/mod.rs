//! Configuration module
//!
//! Handles loading and saving toolkit configuration from TOML files.

use crate::logging::Severity;
use crate::types::EndpointKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod toml_config;

/// Per-endpoint settings
///
/// Addresses and secrets never live here; they come from the credentials
/// file or from the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Path of the JSON credentials file for this endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_file: Option<PathBuf>,
}

impl EndpointConfig {
    /// Credentials file path, falling back to `<config_dir>/<kind>-credentials.json`
    pub fn credential_file_or_default(&self, kind: EndpointKind, config_dir: &Path) -> PathBuf {
        self.credential_file
            .clone()
            .unwrap_or_else(|| config_dir.join(format!("{}-credentials.json", kind)))
    }
}

/// Operation log settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum severity shown on the console
    #[serde(default = "default_console_level")]
    pub console_level: Severity,

    /// File receiving every log line, whatever its severity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_console_level() -> Severity {
    Severity::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: default_console_level(),
            log_file: None,
        }
    }
}

/// Remote adapter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Accept self-signed or otherwise invalid TLS certificates
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_timeout() -> u64 {
    30
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            accept_invalid_certs: false,
        }
    }
}

impl SdkConfig {
    /// Validate the adapter settings
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 || self.timeout_secs > 600 {
            return Err(format!(
                "timeout_secs must be between 1 and 600, got: {}",
                self.timeout_secs
            ));
        }
        Ok(())
    }
}
