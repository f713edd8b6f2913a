//! The UI thread: engine initialization, the multiplexed job/message loop,
//! and teardown.
//!
//! Everything here runs on the one thread that owns the engine. The loop
//! drains queued jobs first; when none are pending it blocks in the
//! engine's message retrieval, which a `Waker` interrupts whenever a job is
//! enqueued. Messages are routed through the `HandleRegistry`: the owning
//! webview gets first refusal, then the engine's default dispatch runs.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;

use blink_common::{CoreError, CoreEvent, CoreState, Disposition, EngineError, EventBus, Message, MessageKind, WindowId};

use crate::assets::AssetProvider;
use crate::engine::{Engine, EnginePaths, Pump};
use crate::queue::Envelope;
use crate::registry::{HandleRegistry, MessageConsumer};
use crate::runtime::CoreShared;
use crate::{lock, panic_message};

pub(crate) type EngineFactory = Box<dyn FnOnce() -> Result<Box<dyn Engine>, EngineError> + Send>;

/// UI-thread state handed to every job.
pub struct UiContext {
    engine: Box<dyn Engine>,
    registry: HandleRegistry,
    events: EventBus,
}

impl UiContext {
    pub fn engine(&mut self) -> &mut dyn Engine {
        self.engine.as_mut()
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HandleRegistry {
        &mut self.registry
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Route messages for `id` to `consumer` and announce the window.
    pub fn adopt_window(&mut self, consumer: &Arc<dyn MessageConsumer>) {
        let id = consumer.window_id();
        self.registry.register(id, Arc::downgrade(consumer));
        self.events.publish(CoreEvent::WindowCreated(id));
    }

    /// Drop the registry entry for `id` and tell its owner the native
    /// window is gone. Returns `false` if no live owner was registered.
    pub fn forget_window(&mut self, id: WindowId) -> bool {
        let owner = self.registry.lookup(id);
        self.registry.unregister(id);
        let Some(owner) = owner else {
            return false;
        };
        notify_destroyed(id, owner.as_ref());
        self.events.publish(CoreEvent::WindowDestroyed(id));
        true
    }

    fn route(&mut self, msg: &Message) {
        self.engine.translate_message(msg);

        let disposition = match self.registry.lookup(msg.window) {
            Some(owner) => offer(owner.as_ref(), msg),
            None => Disposition::Propagate,
        };
        if disposition.should_dispatch() {
            self.engine.dispatch_message(msg);
        } else {
            tracing::trace!(window = %msg.window, kind = %msg.kind, "message consumed by owner");
        }

        if msg.kind == MessageKind::DESTROY {
            self.forget_window(msg.window);
        }
    }

    fn pump(&mut self, jobs: &Receiver<Envelope>) -> LoopExit {
        loop {
            match jobs.try_recv() {
                Ok(Envelope::Job(job)) => {
                    job.run_isolated(self);
                    continue;
                }
                Ok(Envelope::Shutdown) => return LoopExit::Shutdown,
                Err(TryRecvError::Disconnected) => return LoopExit::Disconnected,
                Err(TryRecvError::Empty) => {}
            }

            match self.engine.next_message() {
                Ok(Pump::Woken) => {}
                Ok(Pump::Message(msg)) => self.route(&msg),
                Ok(Pump::Quit) => return LoopExit::Quit,
                Err(e) => {
                    tracing::error!(error = %e, "message retrieval failed");
                    return LoopExit::EngineFailed;
                }
            }
        }
    }

    fn teardown(mut self, shared: &CoreShared, jobs: &Receiver<Envelope>) {
        close_gate(shared, CoreState::ShuttingDown);
        let rejected = reject_pending(jobs);
        if rejected > 0 {
            tracing::warn!(rejected, "rejected jobs queued behind shutdown");
        }

        // Ownerless entries still have native windows behind them.
        for (id, owner) in self.registry.drain() {
            if let Err(e) = self.engine.destroy_window(id) {
                tracing::debug!(window = %id, error = %e, "destroy during teardown failed");
            }
            match owner {
                Some(owner) => notify_destroyed(id, owner.as_ref()),
                None => tracing::debug!(window = %id, "destroyed ownerless window"),
            }
            self.events.publish(CoreEvent::WindowDestroyed(id));
        }

        self.engine.shutdown();
        *lock(&shared.waker) = None;
        lock(&shared.gate).state = CoreState::Stopped;
        self.events.publish(CoreEvent::Stopped);
        tracing::info!("UI thread stopped");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    Shutdown,
    Quit,
    Disconnected,
    EngineFailed,
}

fn offer(owner: &dyn MessageConsumer, msg: &Message) -> Disposition {
    panic::catch_unwind(AssertUnwindSafe(|| owner.process_message(msg))).unwrap_or_else(|payload| {
        tracing::warn!(
            window = %msg.window,
            kind = %msg.kind,
            panic = %panic_message(payload.as_ref()),
            "message handler panicked"
        );
        Disposition::Propagate
    })
}

fn notify_destroyed(id: WindowId, owner: &dyn MessageConsumer) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| owner.window_destroyed())) {
        tracing::warn!(
            window = %id,
            panic = %panic_message(payload.as_ref()),
            "destroy handler panicked"
        );
    }
}

/// Stop accepting jobs. Dropping the sender lets the channel drain to
/// disconnection.
fn close_gate(shared: &CoreShared, state: CoreState) {
    let mut gate = lock(&shared.gate);
    if gate.state != CoreState::Stopped {
        gate.state = state;
    }
    gate.sender = None;
}

/// Drop every job still queued, in FIFO order. Each dropped job's caller
/// observes a closed reply channel and gets `Terminated`.
fn reject_pending(jobs: &Receiver<Envelope>) -> usize {
    jobs.try_iter()
        .filter_map(|envelope| match envelope {
            Envelope::Job(job) => {
                tracing::debug!(job = %job.id(), "rejecting queued job");
                Some(job)
            }
            Envelope::Shutdown => None,
        })
        .count()
}

/// Everything the UI thread needs, moved onto it at spawn.
pub(crate) struct Launch {
    pub shared: Arc<CoreShared>,
    pub factory: EngineFactory,
    pub paths: EnginePaths,
    pub mounts: Vec<(String, Arc<dyn AssetProvider>)>,
    pub jobs: Receiver<Envelope>,
    pub ready: Sender<Result<(), CoreError>>,
    pub exited: Sender<()>,
}

fn initialize(
    factory: EngineFactory,
    paths: &EnginePaths,
    mounts: Vec<(String, Arc<dyn AssetProvider>)>,
) -> Result<Box<dyn Engine>, CoreError> {
    let init_err = |e: EngineError| CoreError::Init(e.to_string());

    let mut engine = factory().map_err(init_err)?;
    engine.initialize(paths).map_err(init_err)?;
    for (mount, provider) in mounts {
        engine
            .register_file_system(&mount, provider)
            .map_err(init_err)?;
        tracing::debug!(mount = %mount, "virtual filesystem registered");
    }
    Ok(engine)
}

/// Body of the UI thread.
pub(crate) fn run(launch: Launch) {
    let Launch {
        shared,
        factory,
        paths,
        mounts,
        jobs,
        ready,
        exited,
    } = launch;

    let _ = shared.ui_thread.set(std::thread::current().id());
    tracing::info!(
        module = %paths.module.display(),
        work_dir = %paths.work_dir.display(),
        "initializing engine"
    );

    let init = panic::catch_unwind(AssertUnwindSafe(|| initialize(factory, &paths, mounts)))
        .unwrap_or_else(|payload| Err(CoreError::Init(panic_message(payload.as_ref()))));

    let engine = match init {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "engine initialization failed");
            close_gate(&shared, CoreState::Stopped);
            reject_pending(&jobs);
            shared.events.publish(CoreEvent::Stopped);
            let _ = ready.send(Err(e));
            let _ = exited.send(());
            return;
        }
    };

    *lock(&shared.waker) = Some(engine.waker());
    {
        let mut gate = lock(&shared.gate);
        if gate.state == CoreState::Starting {
            gate.state = CoreState::Running;
        }
    }
    shared.events.publish(CoreEvent::Started);
    tracing::info!("UI thread running");
    let _ = ready.send(Ok(()));

    let mut ctx = UiContext {
        engine,
        registry: HandleRegistry::new(),
        events: shared.events.clone(),
    };
    let exit = ctx.pump(&jobs);
    tracing::info!(?exit, "UI loop exited");
    ctx.teardown(&shared, &jobs);

    let _ = exited.send(());
}
