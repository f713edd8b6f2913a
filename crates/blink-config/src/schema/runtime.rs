//! Execution core limits: UI thread naming and bounded waits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The `[core]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Name given to the UI thread.
    pub thread_name: String,
    /// Upper bound a caller waits for a submitted job (valid range: 1-600000).
    pub submit_timeout_ms: u64,
    /// Upper bound for engine initialization during start (valid range: 1-600000).
    pub start_timeout_ms: u64,
    /// Upper bound for the UI thread to exit after shutdown (valid range: 1-600000).
    pub shutdown_timeout_ms: u64,
    /// Capacity of the core event broadcast channel (valid range: 1-4096).
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            thread_name: "blink-ui".to_string(),
            submit_timeout_ms: 30_000,
            start_timeout_ms: 10_000,
            shutdown_timeout_ms: 5_000,
            event_capacity: 64,
        }
    }
}

impl RuntimeConfig {
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
