use std::sync::{Arc, Mutex};

use blink_common::{CoreError, Disposition, LifecycleState, Message, MessageKind, WindowId};

use crate::lock;
use crate::registry::MessageConsumer;

pub(crate) type CloseHandler = Arc<dyn Fn(WindowId) -> bool + Send + Sync>;
pub(crate) type DestroyHandler = Arc<dyn Fn(WindowId) + Send + Sync>;
pub(crate) type MessageHook = Box<dyn FnMut(&Message) -> Disposition + Send>;

/// The part of a webview the UI thread routes messages to.
///
/// Handlers are registered from caller threads and invoked on the UI
/// thread, always outside the lock that holds them.
pub(crate) struct WebViewShared {
    window: WindowId,
    state: Mutex<LifecycleState>,
    close_handlers: Mutex<Vec<CloseHandler>>,
    destroy_handlers: Mutex<Vec<DestroyHandler>>,
    hook: Mutex<Option<MessageHook>>,
}

impl WebViewShared {
    pub(crate) fn new(window: WindowId) -> Self {
        Self {
            window,
            state: Mutex::new(LifecycleState::Created),
            close_handlers: Mutex::new(Vec::new()),
            destroy_handlers: Mutex::new(Vec::new()),
            hook: Mutex::new(None),
        }
    }

    pub(crate) fn window(&self) -> WindowId {
        self.window
    }

    pub(crate) fn state(&self) -> LifecycleState {
        *lock(&self.state)
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.state().is_alive()
    }

    pub(crate) fn ensure_alive(&self) -> Result<(), CoreError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(CoreError::WindowDestroyed(self.window))
        }
    }

    /// Move between `Created` and `Shown`. Never resurrects a destroyed view.
    pub(crate) fn set_visible(&self, visible: bool) {
        let mut state = lock(&self.state);
        if state.is_alive() {
            *state = if visible {
                LifecycleState::Shown
            } else {
                LifecycleState::Created
            };
        }
    }

    pub(crate) fn add_close_handler(&self, handler: CloseHandler) {
        lock(&self.close_handlers).push(handler);
    }

    pub(crate) fn add_destroy_handler(&self, handler: DestroyHandler) {
        lock(&self.destroy_handlers).push(handler);
    }

    pub(crate) fn set_hook(&self, hook: Option<MessageHook>) {
        *lock(&self.hook) = hook;
    }

    fn run_hook(&self, msg: &Message) -> Disposition {
        let Some(hook) = lock(&self.hook).take() else {
            return Disposition::Propagate;
        };
        let mut running = RunningHook {
            view: self,
            hook: Some(hook),
        };
        let disposition = match running.hook.as_mut() {
            Some(hook) => hook(msg),
            None => Disposition::Propagate,
        };
        disposition
    }

    /// Ask every close handler. All of them run; any `false` vetoes.
    fn close_requested(&self) -> bool {
        let handlers = lock(&self.close_handlers).clone();
        let mut allowed = true;
        for handler in handlers {
            allowed &= handler(self.window);
        }
        if !allowed {
            tracing::debug!(window = %self.window, "close vetoed");
        }
        allowed
    }
}

/// A hook taken out of its slot for one call. Dropping it puts the hook
/// back, on unwind too, unless a new hook was installed meanwhile or the
/// view was destroyed.
struct RunningHook<'a> {
    view: &'a WebViewShared,
    hook: Option<MessageHook>,
}

impl Drop for RunningHook<'_> {
    fn drop(&mut self) {
        let Some(hook) = self.hook.take() else {
            return;
        };
        if !self.view.is_alive() {
            return;
        }
        let mut slot = lock(&self.view.hook);
        if slot.is_none() {
            *slot = Some(hook);
        }
    }
}

impl MessageConsumer for WebViewShared {
    fn window_id(&self) -> WindowId {
        self.window
    }

    fn process_message(&self, msg: &Message) -> Disposition {
        if self.run_hook(msg) == Disposition::Consumed {
            return Disposition::Consumed;
        }
        if msg.kind == MessageKind::CLOSE {
            return Disposition::from_consumed(!self.close_requested());
        }
        Disposition::Propagate
    }

    fn window_destroyed(&self) {
        {
            let mut state = lock(&self.state);
            if !state.is_alive() {
                return;
            }
            *state = LifecycleState::Destroyed;
        }
        tracing::debug!(window = %self.window, "webview destroyed");

        let handlers = std::mem::take(&mut *lock(&self.destroy_handlers));
        lock(&self.close_handlers).clear();
        self.set_hook(None);
        for handler in handlers {
            handler(self.window);
        }
    }
}
