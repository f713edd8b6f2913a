use std::path::PathBuf;
use std::time::Duration;

use crate::types::WindowId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failure reported across the foreign engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("engine not initialized")]
    NotInitialized,

    #[error("unknown window: {0}")]
    UnknownWindow(WindowId),

    #[error("engine call {call} failed: {reason}")]
    CallFailed { call: &'static str, reason: String },

    #[error("engine module failed to load: {0}")]
    LoadFailed(String),
}

impl EngineError {
    pub fn call_failed(call: &'static str, reason: impl Into<String>) -> Self {
        Self::CallFailed {
            call,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid payload file name: {0:?}")]
    InvalidName(String),
}

/// Errors surfaced to callers of the execution core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("core not initialized")]
    NotInitialized,

    #[error("core already started")]
    AlreadyStarted,

    #[error("core terminated")]
    Terminated,

    #[error("job timed out after {0:?}")]
    Timeout(Duration),

    #[error("job cancelled")]
    Cancelled,

    #[error("job submitted from the UI thread would deadlock")]
    Reentrant,

    #[error("window destroyed: {0}")]
    WindowDestroyed(WindowId),

    #[error("job panicked: {0}")]
    JobPanicked(String),

    #[error("core initialization failed: {0}")]
    Init(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, thiserror::Error)]
pub enum BlinkError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
