// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PodrunError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** validate field
/// values. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to built-in defaults.
///
/// The fallback only applies when the caller did not ask for this file
/// explicitly: a missing `--config` target is an error.
pub fn load_or_default(path: impl AsRef<Path>, explicit: bool) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path.exists() {
        return load_and_validate(path);
    }
    if explicit {
        return Err(PodrunError::ConfigError(format!(
            "config file {} does not exist",
            path.display()
        )));
    }
    debug!(path = %path.display(), "no config file found; using defaults");
    Ok(ConfigFile::default())
}

/// `Podrun.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Podrun.toml")
}
