use crate::config::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

pub const GLOBAL_STATE_DIR: &str = ".rebbeandme";
pub const GLOBAL_SETTINGS_FILE_NAME: &str = "config.yaml";
pub const CHECKPOINT_DB_FILE_NAME: &str = "checkpoints.db";

fn home_dir() -> Result<PathBuf, ConfigError> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or(ConfigError::HomeDirectoryUnavailable)
}

pub fn default_state_root() -> Result<PathBuf, ConfigError> {
    Ok(home_dir()?.join(GLOBAL_STATE_DIR))
}

pub fn default_global_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_state_root()?.join(GLOBAL_SETTINGS_FILE_NAME))
}

/// Creates the state root and its `logs/` directory.
pub fn ensure_state_root(state_root: &Path) -> Result<(), ConfigError> {
    let logs = state_root.join("logs");
    fs::create_dir_all(&logs).map_err(|source| ConfigError::CreateDir {
        path: logs.display().to_string(),
        source,
    })
}
