//! Webview instances.
//!
//! A `WebView` is a caller-side handle to one native window. Each operation
//! is a blocking job on the UI thread; engine failures come back as
//! `CoreError::Engine`. Once the window is destroyed, by `destroy`, by the
//! user closing it, or by core shutdown, every operation fails with
//! `CoreError::WindowDestroyed`.

mod shared;

use std::sync::Arc;

use blink_common::{CoreError, Disposition, EngineError, LifecycleState, Message, WindowId};
use tokio_util::sync::CancellationToken;

use crate::engine::{Engine, WindowOptions};
use crate::registry::MessageConsumer;
use crate::runtime::Core;
use crate::ui_thread::UiContext;

use shared::WebViewShared;

pub struct WebView {
    core: Arc<Core>,
    shared: Arc<WebViewShared>,
}

impl WebView {
    /// Create a native window, register it for message routing, and load
    /// `options.url` if set.
    ///
    /// If the wait runs out after the window was made, the window is
    /// destroyed on the UI thread rather than left without an owner.
    pub fn create(core: &Arc<Core>, options: WindowOptions) -> Result<Self, CoreError> {
        let create = move |ctx: &mut UiContext| -> Result<Arc<WebViewShared>, CoreError> {
            let id = ctx.engine().create_window(&options)?;
            if let Some(url) = &options.url {
                if let Err(e) = ctx.engine().load_url(id, url) {
                    let _ = ctx.engine().destroy_window(id);
                    return Err(e.into());
                }
            }
            let shared = Arc::new(WebViewShared::new(id));
            let consumer: Arc<dyn MessageConsumer> = shared.clone();
            ctx.adopt_window(&consumer);
            tracing::info!(window = %id, title = %options.title, "webview created");
            Ok(shared)
        };
        let orphaned = |ctx: &mut UiContext, created: Result<Arc<WebViewShared>, CoreError>| {
            if let Ok(shared) = created {
                tracing::warn!(window = %shared.window(), "creator stopped waiting; destroying window");
                if let Err(e) = destroy_on_ui(ctx, &shared) {
                    tracing::debug!(window = %shared.window(), error = %e, "orphan destroy failed");
                }
            }
        };
        let shared = core.submit_or_reclaim(&CancellationToken::new(), create, orphaned)??;

        Ok(Self {
            core: Arc::clone(core),
            shared,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.shared.window()
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.state()
    }

    pub fn is_alive(&self) -> bool {
        self.shared.is_alive()
    }

    pub fn core(&self) -> &Arc<Core> {
        &self.core
    }

    /// Run one engine call against this window on the UI thread.
    ///
    /// Liveness is checked on both sides: before submitting, and again on
    /// the UI thread where a close may have landed in between.
    fn call<R, F>(&self, op: &'static str, f: F) -> Result<R, CoreError>
    where
        R: Send + 'static,
        F: FnOnce(&mut dyn Engine, &WebViewShared) -> Result<R, EngineError> + Send + 'static,
    {
        self.shared.ensure_alive()?;
        let shared = Arc::clone(&self.shared);
        self.core.submit(move |ctx| {
            shared.ensure_alive()?;
            tracing::debug!(window = %shared.window(), op, "webview call");
            f(ctx.engine(), &shared).map_err(CoreError::from)
        })?
    }

    pub fn load_url(&self, url: impl Into<String>) -> Result<(), CoreError> {
        let url = url.into();
        self.call("load_url", move |engine, view| engine.load_url(view.window(), &url))
    }

    pub fn load_html(&self, html: impl Into<String>) -> Result<(), CoreError> {
        let html = html.into();
        self.call("load_html", move |engine, view| {
            engine.load_html(view.window(), &html)
        })
    }

    pub fn set_title(&self, title: impl Into<String>) -> Result<(), CoreError> {
        let title = title.into();
        self.call("set_title", move |engine, view| {
            engine.set_title(view.window(), &title)
        })
    }

    pub fn show(&self) -> Result<(), CoreError> {
        self.call("show", |engine, view| {
            engine.show_window(view.window())?;
            view.set_visible(true);
            Ok(())
        })
    }

    pub fn hide(&self) -> Result<(), CoreError> {
        self.call("hide", |engine, view| {
            engine.hide_window(view.window())?;
            view.set_visible(false);
            Ok(())
        })
    }

    pub fn move_to_center(&self) -> Result<(), CoreError> {
        self.call("move_to_center", |engine, view| {
            engine.move_to_center(view.window())
        })
    }

    pub fn resize(&self, width: u32, height: u32) -> Result<(), CoreError> {
        self.call("resize", move |engine, view| {
            engine.resize(view.window(), width, height)
        })
    }

    pub fn evaluate_script(&self, script: impl Into<String>) -> Result<(), CoreError> {
        let script = script.into();
        self.call("evaluate_script", move |engine, view| {
            engine.evaluate_script(view.window(), &script)
        })
    }

    /// Destroy the native window. Destroying twice is a no-op.
    pub fn destroy(&self) -> Result<(), CoreError> {
        if !self.shared.is_alive() {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        self.core.submit(move |ctx| destroy_on_ui(ctx, &shared))?
    }

    /// Called when the user asks to close the window. Returning `false`
    /// from any handler keeps the window open.
    pub fn on_close<F>(&self, handler: F)
    where
        F: Fn(WindowId) -> bool + Send + Sync + 'static,
    {
        self.shared.add_close_handler(Arc::new(handler));
    }

    /// Called once, on the UI thread, when the native window is gone.
    pub fn on_destroy<F>(&self, handler: F)
    where
        F: Fn(WindowId) + Send + Sync + 'static,
    {
        self.shared.add_destroy_handler(Arc::new(handler));
    }

    /// Install a hook that sees every message for this window before the
    /// built-in handling. Returning `Consumed` skips default dispatch.
    pub fn set_message_hook<F>(&self, hook: F)
    where
        F: FnMut(&Message) -> Disposition + Send + 'static,
    {
        self.shared.set_hook(Some(Box::new(hook)));
    }

    pub fn clear_message_hook(&self) {
        self.shared.set_hook(None);
    }
}

fn destroy_on_ui(ctx: &mut UiContext, shared: &WebViewShared) -> Result<(), CoreError> {
    if !shared.is_alive() {
        return Ok(());
    }
    let id = shared.window();
    let result = ctx.engine().destroy_window(id);
    if !ctx.forget_window(id) {
        shared.window_destroyed();
    }
    tracing::info!(window = %id, "webview destroyed");
    result.map_err(CoreError::from)
}

impl Drop for WebView {
    fn drop(&mut self) {
        if !self.shared.is_alive() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        if let Err(e) = self.core.post(move |ctx| {
            if let Err(e) = destroy_on_ui(ctx, &shared) {
                tracing::debug!(window = %shared.window(), error = %e, "deferred destroy failed");
            }
        }) {
            tracing::debug!(window = %self.shared.window(), error = %e, "skipping deferred destroy");
        }
    }
}

impl std::fmt::Debug for WebView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebView")
            .field("window", &self.shared.window())
            .field("state", &self.shared.state())
            .finish()
    }
}
