use serde::{Deserialize, Serialize};

/// Lifecycle of a logical webview instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Created,
    Shown,
    Destroyed,
}

impl LifecycleState {
    pub fn is_alive(self) -> bool {
        self != Self::Destroyed
    }
}

/// Lifecycle of the execution core itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreState {
    /// Constructed; the UI thread has not been spawned.
    Idle,
    /// UI thread spawned, engine initialization in progress. Jobs queue up.
    Starting,
    Running,
    /// Shutdown requested; new jobs are rejected.
    ShuttingDown,
    Stopped,
}

impl CoreState {
    pub fn accepts_jobs(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}
