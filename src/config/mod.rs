//! Locations of engine data on disk.

use std::{env, path::PathBuf};

use dirs::home_dir;
use rex_config::{Config, ConfigError, ConfigManager};

const DEFAULT_DIR_NAME: &str = ".rex";
pub const HOME_ENV: &str = "REX_HOME";

/// Returns the application data directory, `$REX_HOME` or `~/.rex`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn config_manager() -> Result<ConfigManager, ConfigError> {
    ConfigManager::with_base_dir(app_data_dir())
}

pub fn load_config() -> Result<Config, ConfigError> {
    config_manager()?.load()
}
