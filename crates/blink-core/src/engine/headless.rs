//! Pure-Rust engine with no native window system behind it.
//!
//! Windows are plain records, the message queue is a `VecDeque` guarded by
//! a condvar, and every call is recorded so callers can observe exactly
//! what reached the engine. A `HeadlessHandle` drives the engine from other
//! threads the way a user and the OS would: posting messages, closing
//! windows, quitting the loop.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use blink_common::{EngineError, Message, MessageKind, WindowId};

use super::{Engine, EnginePaths, Pump, WindowOptions, Waker};
use crate::assets::AssetProvider;
use crate::lock;

/// First window id handed out; later windows count up from here.
pub const FIRST_WINDOW_ID: isize = 1001;

/// One call that reached the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Initialize(EnginePaths),
    RegisterFileSystem(String),
    CreateWindow(WindowId),
    DestroyWindow(WindowId),
    LoadUrl(WindowId, String),
    LoadHtml(WindowId, String),
    SetTitle(WindowId, String),
    ShowWindow(WindowId),
    HideWindow(WindowId),
    MoveToCenter(WindowId),
    Resize(WindowId, u32, u32),
    EvaluateScript(WindowId, String),
    Dispatch(Message),
    Shutdown,
}

/// Snapshot of a headless window's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessWindow {
    pub title: String,
    pub url: Option<String>,
    pub html: Option<String>,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
    pub centered: bool,
    pub transparent: bool,
}

#[derive(Default)]
struct PendingQueue {
    messages: VecDeque<Message>,
    /// Sticky until the next retrieval observes it.
    woken: bool,
    quit: bool,
}

#[derive(Default)]
struct Shared {
    pending: Mutex<PendingQueue>,
    ready: Condvar,
    windows: Mutex<BTreeMap<WindowId, HeadlessWindow>>,
    calls: Mutex<Vec<EngineCall>>,
    mounts: Mutex<HashMap<String, Arc<dyn AssetProvider>>>,
}

impl Shared {
    fn record(&self, call: EngineCall) {
        lock(&self.calls).push(call);
    }

    fn post(&self, msg: Message) {
        lock(&self.pending).messages.push_back(msg);
        self.ready.notify_one();
    }
}

struct HeadlessWaker {
    shared: Arc<Shared>,
}

impl Waker for HeadlessWaker {
    fn wake(&self) {
        lock(&self.shared.pending).woken = true;
        self.shared.ready.notify_one();
    }
}

pub struct HeadlessEngine {
    shared: Arc<Shared>,
    next_id: isize,
    initialized: bool,
    init_failure: Option<String>,
    create_delay: Option<Duration>,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            next_id: FIRST_WINDOW_ID,
            initialized: false,
            init_failure: None,
            create_delay: None,
        }
    }

    /// Make `initialize` fail as if the engine module could not be loaded.
    pub fn with_init_failure(mut self, reason: impl Into<String>) -> Self {
        self.init_failure = Some(reason.into());
        self
    }

    /// Make every `create_window` block for `delay` first, like a native
    /// window that is slow to come up.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn handle(&self) -> HeadlessHandle {
        HeadlessHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    fn ensure_initialized(&self) -> Result<(), EngineError> {
        if self.initialized {
            Ok(())
        } else {
            Err(EngineError::NotInitialized)
        }
    }

    fn with_window<T>(
        &self,
        window: WindowId,
        f: impl FnOnce(&mut HeadlessWindow) -> T,
    ) -> Result<T, EngineError> {
        self.ensure_initialized()?;
        let mut windows = lock(&self.shared.windows);
        let entry = windows
            .get_mut(&window)
            .ok_or(EngineError::UnknownWindow(window))?;
        Ok(f(entry))
    }

    fn remove_window(&mut self, window: WindowId) -> Result<(), EngineError> {
        self.ensure_initialized()?;
        if lock(&self.shared.windows).remove(&window).is_none() {
            return Err(EngineError::UnknownWindow(window));
        }
        self.shared
            .post(Message::new(window, MessageKind::DESTROY));
        Ok(())
    }
}

impl Engine for HeadlessEngine {
    fn initialize(&mut self, paths: &EnginePaths) -> Result<(), EngineError> {
        self.shared.record(EngineCall::Initialize(paths.clone()));
        if let Some(reason) = &self.init_failure {
            return Err(EngineError::LoadFailed(reason.clone()));
        }
        tracing::debug!(module = %paths.module.display(), "headless engine initialized");
        self.initialized = true;
        Ok(())
    }

    fn register_file_system(
        &mut self,
        mount: &str,
        provider: Arc<dyn AssetProvider>,
    ) -> Result<(), EngineError> {
        self.ensure_initialized()?;
        if mount.is_empty() {
            return Err(EngineError::call_failed(
                "register_file_system",
                "empty mount name",
            ));
        }
        self.shared
            .record(EngineCall::RegisterFileSystem(mount.to_string()));
        lock(&self.shared.mounts).insert(mount.to_string(), provider);
        Ok(())
    }

    fn waker(&self) -> Arc<dyn Waker> {
        Arc::new(HeadlessWaker {
            shared: Arc::clone(&self.shared),
        })
    }

    fn next_message(&mut self) -> Result<Pump, EngineError> {
        let mut pending = lock(&self.shared.pending);
        loop {
            if let Some(msg) = pending.messages.pop_front() {
                return Ok(Pump::Message(msg));
            }
            if pending.woken {
                pending.woken = false;
                return Ok(Pump::Woken);
            }
            if pending.quit {
                return Ok(Pump::Quit);
            }
            pending = self
                .shared
                .ready
                .wait(pending)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    fn translate_message(&mut self, _msg: &Message) {}

    fn dispatch_message(&mut self, msg: &Message) {
        self.shared.record(EngineCall::Dispatch(*msg));
        if msg.kind == MessageKind::CLOSE {
            // Default close handling tears the window down.
            if let Err(e) = self.remove_window(msg.window) {
                tracing::debug!(window = %msg.window, error = %e, "close for unknown window");
            }
        }
    }

    fn create_window(&mut self, options: &WindowOptions) -> Result<WindowId, EngineError> {
        self.ensure_initialized()?;
        if let Some(delay) = self.create_delay {
            std::thread::sleep(delay);
        }
        let id = WindowId(self.next_id);
        self.next_id += 1;
        lock(&self.shared.windows).insert(
            id,
            HeadlessWindow {
                title: options.title.clone(),
                url: None,
                html: None,
                width: options.width,
                height: options.height,
                visible: false,
                centered: false,
                transparent: options.transparent,
            },
        );
        self.shared.record(EngineCall::CreateWindow(id));
        Ok(id)
    }

    fn destroy_window(&mut self, window: WindowId) -> Result<(), EngineError> {
        self.remove_window(window)?;
        self.shared.record(EngineCall::DestroyWindow(window));
        Ok(())
    }

    fn load_url(&mut self, window: WindowId, url: &str) -> Result<(), EngineError> {
        if url.is_empty() {
            return Err(EngineError::call_failed("load_url", "empty url"));
        }
        self.with_window(window, |w| {
            w.url = Some(url.to_string());
            w.html = None;
        })?;
        self.shared
            .record(EngineCall::LoadUrl(window, url.to_string()));
        Ok(())
    }

    fn load_html(&mut self, window: WindowId, html: &str) -> Result<(), EngineError> {
        self.with_window(window, |w| {
            w.html = Some(html.to_string());
            w.url = None;
        })?;
        self.shared
            .record(EngineCall::LoadHtml(window, html.to_string()));
        Ok(())
    }

    fn set_title(&mut self, window: WindowId, title: &str) -> Result<(), EngineError> {
        self.with_window(window, |w| w.title = title.to_string())?;
        self.shared
            .record(EngineCall::SetTitle(window, title.to_string()));
        Ok(())
    }

    fn show_window(&mut self, window: WindowId) -> Result<(), EngineError> {
        self.with_window(window, |w| w.visible = true)?;
        self.shared.record(EngineCall::ShowWindow(window));
        Ok(())
    }

    fn hide_window(&mut self, window: WindowId) -> Result<(), EngineError> {
        self.with_window(window, |w| w.visible = false)?;
        self.shared.record(EngineCall::HideWindow(window));
        Ok(())
    }

    fn move_to_center(&mut self, window: WindowId) -> Result<(), EngineError> {
        self.with_window(window, |w| w.centered = true)?;
        self.shared.record(EngineCall::MoveToCenter(window));
        Ok(())
    }

    fn resize(&mut self, window: WindowId, width: u32, height: u32) -> Result<(), EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::call_failed("resize", "zero-sized window"));
        }
        self.with_window(window, |w| {
            w.width = width;
            w.height = height;
        })?;
        self.shared
            .record(EngineCall::Resize(window, width, height));
        Ok(())
    }

    fn evaluate_script(&mut self, window: WindowId, script: &str) -> Result<(), EngineError> {
        self.with_window(window, |_| ())?;
        self.shared
            .record(EngineCall::EvaluateScript(window, script.to_string()));
        Ok(())
    }

    fn shutdown(&mut self) {
        self.shared.record(EngineCall::Shutdown);
        lock(&self.shared.windows).clear();
        lock(&self.shared.mounts).clear();
        self.initialized = false;
    }
}

/// Thread-safe view of a `HeadlessEngine` that stays valid after the engine
/// has moved onto the UI thread.
#[derive(Clone)]
pub struct HeadlessHandle {
    shared: Arc<Shared>,
}

impl HeadlessHandle {
    pub fn post_message(&self, msg: Message) {
        self.shared.post(msg);
    }

    /// Post a user close request for `window`.
    pub fn close_window(&self, window: WindowId) {
        self.post_message(Message::new(window, MessageKind::CLOSE));
    }

    /// End the engine's message loop.
    pub fn quit(&self) {
        lock(&self.shared.pending).quit = true;
        self.shared.ready.notify_one();
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.shared.calls).clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        lock(&self.shared.calls).iter().filter(|c| pred(c)).count()
    }

    pub fn window(&self, id: WindowId) -> Option<HeadlessWindow> {
        lock(&self.shared.windows).get(&id).cloned()
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        lock(&self.shared.windows).keys().copied().collect()
    }

    pub fn mounts(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.shared.mounts).keys().cloned().collect();
        names.sort();
        names
    }

    /// Read through a mounted filesystem the way the engine would.
    pub fn read_asset(&self, mount: &str, path: &str) -> Option<Vec<u8>> {
        let provider = lock(&self.shared.mounts).get(mount).cloned()?;
        provider.asset(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::EmbeddedAssets;

    fn initialized() -> HeadlessEngine {
        let mut engine = HeadlessEngine::new();
        engine
            .initialize(&EnginePaths::new("blink.dll", "/tmp/blink", "/tmp/blink/cookie.dat"))
            .unwrap();
        engine
    }

    #[test]
    fn calls_before_initialize_fail() {
        let mut engine = HeadlessEngine::new();
        assert_eq!(
            engine.create_window(&WindowOptions::default()),
            Err(EngineError::NotInitialized)
        );
    }

    #[test]
    fn init_failure_is_reported() {
        let mut engine = HeadlessEngine::new().with_init_failure("missing module");
        let err = engine
            .initialize(&EnginePaths::new("x", "y", "z"))
            .unwrap_err();
        assert_eq!(err, EngineError::LoadFailed("missing module".into()));
    }

    #[test]
    fn window_ids_count_up_from_first() {
        let mut engine = initialized();
        let a = engine.create_window(&WindowOptions::default()).unwrap();
        let b = engine.create_window(&WindowOptions::default()).unwrap();
        assert_eq!(a, WindowId(FIRST_WINDOW_ID));
        assert_eq!(b, WindowId(FIRST_WINDOW_ID + 1));
    }

    #[test]
    fn window_calls_update_state() {
        let mut engine = initialized();
        let handle = engine.handle();
        let id = engine.create_window(&WindowOptions::default()).unwrap();
        engine.set_title(id, "X").unwrap();
        engine.load_url(id, "about:blank").unwrap();
        engine.show_window(id).unwrap();
        engine.resize(id, 640, 480).unwrap();

        let window = handle.window(id).unwrap();
        assert_eq!(window.title, "X");
        assert_eq!(window.url.as_deref(), Some("about:blank"));
        assert!(window.visible);
        assert_eq!((window.width, window.height), (640, 480));
        assert_eq!(
            handle.count_calls(|c| matches!(c, EngineCall::SetTitle(_, t) if t == "X")),
            1
        );
    }

    #[test]
    fn unknown_window_is_an_error() {
        let mut engine = initialized();
        assert_eq!(
            engine.show_window(WindowId(42)),
            Err(EngineError::UnknownWindow(WindowId(42)))
        );
    }

    #[test]
    fn destroy_posts_destroy_message() {
        let mut engine = initialized();
        let id = engine.create_window(&WindowOptions::default()).unwrap();
        engine.destroy_window(id).unwrap();
        assert_eq!(
            engine.next_message().unwrap(),
            Pump::Message(Message::new(id, MessageKind::DESTROY))
        );
        assert!(engine.handle().window(id).is_none());
    }

    #[test]
    fn default_close_destroys_window() {
        let mut engine = initialized();
        let handle = engine.handle();
        let id = engine.create_window(&WindowOptions::default()).unwrap();
        engine.dispatch_message(&Message::new(id, MessageKind::CLOSE));
        assert!(handle.window(id).is_none());
        assert_eq!(
            engine.next_message().unwrap(),
            Pump::Message(Message::new(id, MessageKind::DESTROY))
        );
    }

    #[test]
    fn wake_before_wait_is_not_lost() {
        let mut engine = initialized();
        engine.waker().wake();
        assert_eq!(engine.next_message().unwrap(), Pump::Woken);
    }

    #[test]
    fn wake_from_other_thread_interrupts_wait() {
        let mut engine = initialized();
        let waker = engine.waker();
        let t = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            waker.wake();
        });
        assert_eq!(engine.next_message().unwrap(), Pump::Woken);
        t.join().unwrap();
    }

    #[test]
    fn quit_ends_the_pump_after_messages() {
        let mut engine = initialized();
        let handle = engine.handle();
        handle.post_message(Message::new(WindowId(5), MessageKind::USER));
        handle.quit();
        assert!(matches!(engine.next_message().unwrap(), Pump::Message(_)));
        assert_eq!(engine.next_message().unwrap(), Pump::Quit);
    }

    #[test]
    fn mounted_assets_are_readable() {
        let mut engine = initialized();
        let handle = engine.handle();
        let assets = EmbeddedAssets::new(&[("inspector.html", b"<html></html>")]);
        engine
            .register_file_system("__devtools__", Arc::new(assets))
            .unwrap();
        assert_eq!(handle.mounts(), vec!["__devtools__"]);
        assert_eq!(
            handle.read_asset("__devtools__", "inspector.html").unwrap(),
            b"<html></html>"
        );
        assert!(handle.read_asset("other", "inspector.html").is_none());
    }

    #[test]
    fn shutdown_clears_windows() {
        let mut engine = initialized();
        let handle = engine.handle();
        engine.create_window(&WindowOptions::default()).unwrap();
        engine.shutdown();
        assert!(handle.window_ids().is_empty());
        assert_eq!(handle.calls().last(), Some(&EngineCall::Shutdown));
    }
}
