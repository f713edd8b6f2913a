//! Reading `config.toml`, and writing the commented default on first run.
//!
//! Loading only parses; `crate::load_config` and `crate::load_config_from`
//! validate on top.

mod template;

#[cfg(test)]
mod tests;

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use blink_common::ConfigError;

use crate::schema::BlinkConfig;
use template::default_config_toml;

/// Parse TOML text, filling every missing field from defaults.
pub fn parse(content: &str) -> Result<BlinkConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))
}

pub fn load_from_path(path: &Path) -> Result<BlinkConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("failed to read {}: {e}", path.display())),
    })?;
    let config = parse(&content)?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Load `config.toml` from the platform config directory, writing the
/// default file first if there is none.
pub fn load_default() -> Result<BlinkConfig, ConfigError> {
    let path = crate::paths::config_file()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            write_default_config(&path)?;
            load_from_path(&path)
        }
        loaded => loaded,
    }
}

/// Write the commented default config to `path`. An existing file is left
/// untouched, so two first runs racing each other keep one copy.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_err = |e: std::io::Error| {
        ConfigError::ParseError(format!("failed to write default config to {}: {e}", path.display()))
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(()),
        Err(e) => return Err(write_err(e)),
    };
    file.write_all(default_config_toml().as_bytes())
        .map_err(write_err)?;
    tracing::info!(path = %path.display(), "created default config");
    Ok(())
}
