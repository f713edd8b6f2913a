//! The foreign engine boundary.
//!
//! `Engine` is the C-style surface of the native webview module expressed
//! as a trait. Implementations are thread-affine: an engine is built on the
//! UI thread and never leaves it, so the trait does not require `Send`.
//! Every call is fallible; failures travel back to the submitting caller.

pub mod headless;

use std::path::PathBuf;
use std::sync::Arc;

use blink_common::{EngineError, Message, WindowId};
use blink_config::schema::{EngineConfig, WindowConfig};

use crate::assets::AssetProvider;

/// The three paths handed to the engine's initialization entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePaths {
    /// Engine module (the staged or configured binary).
    pub module: PathBuf,
    /// Temporary working directory.
    pub work_dir: PathBuf,
    /// Persistent cookie/session state file.
    pub cookie_file: PathBuf,
}

impl EnginePaths {
    pub fn new(
        module: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
        cookie_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            module: module.into(),
            work_dir: work_dir.into(),
            cookie_file: cookie_file.into(),
        }
    }

    /// Resolve work dir and cookie file from config around a known module path.
    pub fn from_config(engine: &EngineConfig, module: impl Into<PathBuf>) -> Self {
        Self {
            module: module.into(),
            work_dir: blink_config::paths::work_dir(engine),
            cookie_file: blink_config::paths::cookie_file(engine),
        }
    }
}

/// Options for a new native window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub transparent: bool,
    /// Loaded right after creation, inside the same job.
    pub url: Option<String>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self::from(&WindowConfig::default())
    }
}

impl From<&WindowConfig> for WindowOptions {
    fn from(config: &WindowConfig) -> Self {
        Self {
            title: config.title.clone(),
            width: config.width,
            height: config.height,
            transparent: config.transparent,
            url: config.url.clone(),
        }
    }
}

impl WindowOptions {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Outcome of one blocking message retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pump {
    /// A native UI message for routing.
    Message(Message),
    /// The wait was interrupted by a `Waker`; check the job queue.
    Woken,
    /// The engine's message loop is over.
    Quit,
}

/// Interrupts the UI thread's blocking message wait from any thread.
///
/// Wakes must be level-triggered: a wake issued before the UI thread
/// blocks makes the next `next_message` return `Pump::Woken`.
pub trait Waker: Send + Sync {
    fn wake(&self);
}

pub trait Engine {
    /// Load the engine module and prepare its working state.
    fn initialize(&mut self, paths: &EnginePaths) -> Result<(), EngineError>;

    /// Mount an asset provider under `mount` for the engine's internal resources.
    fn register_file_system(
        &mut self,
        mount: &str,
        provider: Arc<dyn AssetProvider>,
    ) -> Result<(), EngineError>;

    fn waker(&self) -> Arc<dyn Waker>;

    /// Block until a message arrives, a waker fires, or the loop quits.
    fn next_message(&mut self) -> Result<Pump, EngineError>;

    fn translate_message(&mut self, msg: &Message);

    /// Default handling for a message no owner consumed.
    fn dispatch_message(&mut self, msg: &Message);

    fn create_window(&mut self, options: &WindowOptions) -> Result<WindowId, EngineError>;

    fn destroy_window(&mut self, window: WindowId) -> Result<(), EngineError>;

    fn load_url(&mut self, window: WindowId, url: &str) -> Result<(), EngineError>;

    fn load_html(&mut self, window: WindowId, html: &str) -> Result<(), EngineError>;

    fn set_title(&mut self, window: WindowId, title: &str) -> Result<(), EngineError>;

    fn show_window(&mut self, window: WindowId) -> Result<(), EngineError>;

    fn hide_window(&mut self, window: WindowId) -> Result<(), EngineError>;

    fn move_to_center(&mut self, window: WindowId) -> Result<(), EngineError>;

    fn resize(&mut self, window: WindowId, width: u32, height: u32) -> Result<(), EngineError>;

    fn evaluate_script(&mut self, window: WindowId, script: &str) -> Result<(), EngineError>;

    /// Release engine resources. Called once, last, on the UI thread.
    fn shutdown(&mut self) {}
}
