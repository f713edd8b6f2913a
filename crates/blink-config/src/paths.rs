//! Platform directories and engine path resolution.

use std::path::PathBuf;

use blink_common::ConfigError;

use crate::schema::EngineConfig;

pub(crate) const APP_NAME: &str = "blink";

/// Returns the platform-specific configuration directory.
///
/// - Linux: `$XDG_CONFIG_HOME/blink` (defaults to `~/.config/blink`)
/// - Windows: `%APPDATA%\blink`
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    Ok(dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?
        .join(APP_NAME))
}

/// Returns the path to the main configuration file.
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Default engine working directory: `<system temp>/blink`.
pub fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join(APP_NAME)
}

/// The configured work directory, or the default.
pub fn work_dir(engine: &EngineConfig) -> PathBuf {
    engine.work_dir.clone().unwrap_or_else(default_work_dir)
}

/// The cookie/session state file. Relative names resolve inside the work directory.
pub fn cookie_file(engine: &EngineConfig) -> PathBuf {
    let cookie = PathBuf::from(&engine.cookie_file);
    if cookie.is_absolute() {
        cookie
    } else {
        work_dir(engine).join(cookie)
    }
}
