//! Single-thread execution core for embedding a native webview engine.
//!
//! The native engine's UI objects are thread-affine, so every call into it
//! runs on one dedicated UI thread that also pumps the native message loop:
//! - `Core` owns the job queue and the UI thread lifecycle (start/shutdown)
//! - `WebView` turns each operation into a blocking job on that thread
//! - `HandleRegistry` routes inbound UI messages to the owning webview
//! - `Engine` is the foreign-function boundary; `HeadlessEngine` implements it in Rust
//! - `assets` and `staging` cover virtual filesystems and payload staging

pub mod assets;
pub mod engine;
pub mod registry;
pub mod runtime;
pub mod staging;
pub mod webview;

mod queue;
mod ui_thread;

pub use assets::{AssetInfo, AssetProvider, DirAssetProvider, EmbeddedAssets};
pub use engine::headless::{EngineCall, HeadlessEngine, HeadlessHandle};
pub use engine::{Engine, EnginePaths, Pump, WindowOptions, Waker};
pub use registry::{HandleRegistry, MessageConsumer};
pub use runtime::Core;
pub use staging::{stage_payload, sweep_stale, StagedPayload};
pub use tokio_util::sync::CancellationToken;
pub use ui_thread::UiContext;
pub use webview::WebView;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a panicking job poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
