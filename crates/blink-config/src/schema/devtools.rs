//! Virtual filesystem mounts, including the developer-tools assets.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Mount name the engine uses to serve its developer tools.
pub const DEVTOOLS_MOUNT: &str = "__devtools__";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DevtoolsConfig {
    /// Always on in debug builds.
    pub enabled: bool,
    pub mount: String,
    /// Directory holding the developer-tools front-end.
    pub assets_dir: Option<PathBuf>,
}

impl Default for DevtoolsConfig {
    fn default() -> Self {
        Self {
            enabled: cfg!(debug_assertions),
            mount: DEVTOOLS_MOUNT.to_string(),
            assets_dir: None,
        }
    }
}

/// One `[[filesystems]]` entry: a named mount backed by a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystemMount {
    pub mount: String,
    pub root: PathBuf,
}
