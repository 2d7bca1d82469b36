//! Configuration loading.

use crate::common::SimError;
use crate::config::Config;
use std::fs;

/// Reads and parses a TOML configuration file.
pub fn load_config(path: &str) -> Result<Config, SimError> {
    let text = fs::read_to_string(path)
        .map_err(|e| SimError::config(format!("could not read '{}': {}", path, e)))?;
    let config = Config::from_toml(&text)?;
    log::info!("loaded configuration from {}", path);
    Ok(config)
}
