//! Configuration schema types for blink.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults documented on each field.

mod devtools;
mod engine;
mod runtime;
mod system;
mod window;

pub use devtools::*;
pub use engine::*;
pub use runtime::*;
pub use system::*;
pub use window::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BlinkConfig {
    pub engine: EngineConfig,
    #[serde(rename = "core")]
    pub runtime: RuntimeConfig,
    pub staging: StagingConfig,
    pub window: WindowConfig,
    pub devtools: DevtoolsConfig,
    pub filesystems: Vec<FileSystemMount>,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_runtime_limits() {
        let config = BlinkConfig::default();
        assert_eq!(config.runtime.thread_name, "blink-ui");
        assert_eq!(config.runtime.submit_timeout_ms, 30_000);
        assert_eq!(config.runtime.start_timeout_ms, 10_000);
        assert_eq!(config.runtime.shutdown_timeout_ms, 5_000);
        assert_eq!(config.runtime.event_capacity, 64);
    }

    #[test]
    fn default_engine_paths() {
        let config = BlinkConfig::default();
        assert!(config.engine.module_path.is_none());
        assert!(config.engine.work_dir.is_none());
        assert_eq!(config.engine.cookie_file, "cookie.dat");
    }

    #[test]
    fn default_staging() {
        let config = BlinkConfig::default();
        assert_eq!(config.staging.prefix, "blink-");
        assert_eq!(config.staging.file_name, "blink.dll");
        assert_eq!(config.staging.stale_after_secs, 86_400);
    }

    #[test]
    fn default_window() {
        let config = BlinkConfig::default();
        assert_eq!(config.window.title, "blink");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 800);
        assert!(!config.window.transparent);
        assert!(config.window.url.is_none());
    }

    #[test]
    fn default_devtools_mount() {
        let config = BlinkConfig::default();
        assert_eq!(config.devtools.mount, "__devtools__");
        assert_eq!(config.devtools.enabled, cfg!(debug_assertions));
        assert!(config.filesystems.is_empty());
    }

    #[test]
    fn core_section_maps_to_runtime() {
        let config: BlinkConfig = toml::from_str(
            r#"
[core]
thread_name = "ui"
submit_timeout_ms = 500
"#,
        )
        .unwrap();
        assert_eq!(config.runtime.thread_name, "ui");
        assert_eq!(config.runtime.submit_timeout_ms, 500);
        assert_eq!(config.runtime.shutdown_timeout_ms, 5_000);
    }

    #[test]
    fn filesystems_parse_as_array_of_tables() {
        let config: BlinkConfig = toml::from_str(
            r#"
[[filesystems]]
mount = "app"
root = "/srv/app"

[[filesystems]]
mount = "docs"
root = "/srv/docs"
"#,
        )
        .unwrap();
        assert_eq!(config.filesystems.len(), 2);
        assert_eq!(config.filesystems[0].mount, "app");
        assert_eq!(config.filesystems[1].root.to_str(), Some("/srv/docs"));
    }

    #[test]
    fn log_level_uppercase() {
        let config: BlinkConfig = toml::from_str("[logging]\nlevel = \"DEBUG\"\n").unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.level.as_directive(), "debug");
    }
}
