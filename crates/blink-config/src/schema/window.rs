//! Initial window options.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Initial width in pixels (valid range: 100-16384).
    pub width: u32,
    /// Initial height in pixels (valid range: 100-16384).
    pub height: u32,
    pub transparent: bool,
    /// URL loaded right after creation.
    pub url: Option<String>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "blink".to_string(),
            width: 1280,
            height: 800,
            transparent: false,
            url: None,
        }
    }
}
