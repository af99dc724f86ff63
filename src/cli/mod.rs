//! CLI command implementations
//!
//! This module contains the implementation of all CLI subcommands.

pub mod check;
pub mod connect;
pub mod prompt;
pub mod token;
pub mod validate;

use std::path::{Path, PathBuf};
use vmlink_core::config::toml_config::{
    get_config_dir, get_config_path, load_config_from_path, TomlConfig,
};
use vmlink_core::error::VmlinkError;

/// Loaded configuration and the directory relative paths resolve against
pub struct Settings {
    pub config: TomlConfig,
    pub config_dir: PathBuf,
}

/// Load the configuration file, applying command-line overrides
pub fn load_settings(
    config_path: Option<&Path>,
    non_interactive: bool,
) -> Result<Settings, VmlinkError> {
    let (path, config_dir) = match config_path {
        Some(path) => {
            let dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (path.to_path_buf(), dir)
        }
        None => {
            let dir = get_config_dir()?;
            (get_config_path()?, dir)
        }
    };

    let mut config = load_config_from_path(&path)?;
    if non_interactive {
        config.reconnection.non_interactive = true;
    }
    config.validate()?;

    Ok(Settings { config, config_dir })
}
