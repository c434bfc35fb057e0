use dirs::home_dir;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::errors::Result;

pub const HOME_ENV: &str = "MEALBANK_HOME";

const DEFAULT_DIR_NAME: &str = ".mealbank";
const DATA_DIR: &str = "data";
const CONFIG_FILE: &str = "config.json";
const LEGACY_SNAPSHOT: &str = "legacy.json";

/// Returns the application data directory, defaulting to `~/.mealbank`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding the JSON store and its backups.
pub fn data_dir_in(base: &Path) -> PathBuf {
    base.join(DATA_DIR)
}

pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

/// Where a pre-store snapshot is looked for on startup.
pub fn legacy_snapshot_in(base: &Path) -> PathBuf {
    base.join(LEGACY_SNAPSHOT)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
