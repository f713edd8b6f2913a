//! Engine module location and payload staging.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the native engine module and its state live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Explicit module path. When unset the embedded payload is staged.
    pub module_path: Option<PathBuf>,
    /// Engine working directory. Defaults to `<temp>/blink`.
    pub work_dir: Option<PathBuf>,
    /// Cookie/session state file, relative to the work directory unless absolute.
    pub cookie_file: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            module_path: None,
            work_dir: None,
            cookie_file: "cookie.dat".to_string(),
        }
    }
}

/// Staging of the engine binary payload before load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Directory-name prefix for per-run staging directories.
    pub prefix: String,
    /// File name of the staged module inside the staging directory.
    pub file_name: String,
    /// Staging directories from earlier runs older than this are swept (valid range: 60-2592000).
    pub stale_after_secs: u64,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            prefix: "blink-".to_string(),
            file_name: "blink.dll".to_string(),
            stale_after_secs: 86_400,
        }
    }
}
