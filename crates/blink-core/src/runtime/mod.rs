//! `Core`: the job queue front end and the UI thread's lifecycle.
//!
//! Callers on any thread submit closures that run on the UI thread against
//! the engine. A submission blocks until the closure has run (or the wait
//! is bounded out), so results flow back as ordinary return values.
//!
//! State gate:
//! - `Idle`: submissions fail with `NotInitialized`
//! - `Starting`: submissions queue and run once the engine is initialized
//! - `Running`: submissions queue
//! - `ShuttingDown` / `Stopped`: submissions fail with `Terminated`

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use blink_common::{new_correlation_id, CoreError, CoreEvent, CoreState, EngineError, EventBus};
use blink_config::schema::{BlinkConfig, RuntimeConfig};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::assets::{AssetProvider, DirAssetProvider};
use crate::engine::{Engine, EnginePaths, Waker};
use crate::queue::{Envelope, Job};
use crate::ui_thread::{self, EngineFactory, Launch, UiContext};
use crate::{lock, panic_message};

/// How often a blocked submitter re-checks its cancellation token.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub(crate) struct Gate {
    pub state: CoreState,
    /// Present while the core accepts jobs. Sends happen under the gate
    /// lock so the state check and the enqueue are one step.
    pub sender: Option<Sender<Envelope>>,
}

/// State shared between `Core` and the UI thread.
pub(crate) struct CoreShared {
    pub gate: Mutex<Gate>,
    pub waker: Mutex<Option<Arc<dyn Waker>>>,
    pub ui_thread: OnceLock<ThreadId>,
    pub events: EventBus,
}

pub struct Core {
    config: RuntimeConfig,
    paths: EnginePaths,
    shared: Arc<CoreShared>,
    /// Mounts registered before start; handed to the UI thread.
    mounts: Mutex<Vec<(String, Arc<dyn AssetProvider>)>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    exited: Mutex<Option<Receiver<()>>>,
}

impl Core {
    pub fn new(config: RuntimeConfig, paths: EnginePaths) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            config,
            paths,
            shared: Arc::new(CoreShared {
                gate: Mutex::new(Gate {
                    state: CoreState::Idle,
                    sender: None,
                }),
                waker: Mutex::new(None),
                ui_thread: OnceLock::new(),
                events,
            }),
            mounts: Mutex::new(Vec::new()),
            thread: Mutex::new(None),
            exited: Mutex::new(None),
        }
    }

    /// Build a core from a loaded config, mounting `[[filesystems]]` and,
    /// when enabled, the developer-tools assets.
    pub fn from_config(config: &BlinkConfig, module: impl Into<std::path::PathBuf>) -> Self {
        let mut core = Self::new(
            config.runtime.clone(),
            EnginePaths::from_config(&config.engine, module),
        );
        for fs in &config.filesystems {
            core = core.with_mount(&fs.mount, Arc::new(DirAssetProvider::new(&fs.root)));
        }
        if config.devtools.enabled {
            if let Some(dir) = &config.devtools.assets_dir {
                core = core.with_mount(&config.devtools.mount, Arc::new(DirAssetProvider::new(dir)));
            }
        }
        core
    }

    /// Register a virtual filesystem to mount during engine initialization.
    pub fn with_mount(self, mount: &str, provider: Arc<dyn AssetProvider>) -> Self {
        lock(&self.mounts).push((mount.to_string(), provider));
        self
    }

    /// Mount a virtual filesystem. Before start it is queued for
    /// initialization; afterwards it is registered by a job.
    pub fn mount(&self, mount: &str, provider: Arc<dyn AssetProvider>) -> Result<(), CoreError> {
        {
            // `start` takes the pending mounts under the gate lock.
            let gate = lock(&self.shared.gate);
            if gate.state == CoreState::Idle {
                lock(&self.mounts).push((mount.to_string(), provider));
                return Ok(());
            }
        }
        let mount = mount.to_string();
        self.submit(move |ctx| ctx.engine().register_file_system(&mount, provider))?
            .map_err(CoreError::from)
    }

    pub fn state(&self) -> CoreState {
        lock(&self.shared.gate).state
    }

    pub fn paths(&self) -> &EnginePaths {
        &self.paths
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_ui_thread(&self) -> bool {
        self.shared
            .ui_thread
            .get()
            .is_some_and(|id| *id == std::thread::current().id())
    }

    // =========================================================================
    // START
    // =========================================================================

    /// Spawn the UI thread and initialize the engine on it.
    ///
    /// `factory` runs on the UI thread, so the engine is created where it
    /// will live. Returns once initialization succeeded or failed; jobs
    /// submitted meanwhile run only after it succeeded.
    pub fn start<E, F>(&self, factory: F) -> Result<(), CoreError>
    where
        E: Engine + 'static,
        F: FnOnce() -> Result<E, EngineError> + Send + 'static,
    {
        let (jobs, mounts) = {
            let mut gate = lock(&self.shared.gate);
            if gate.state != CoreState::Idle {
                return Err(CoreError::AlreadyStarted);
            }
            let (sender, jobs) = mpsc::channel();
            gate.sender = Some(sender);
            gate.state = CoreState::Starting;
            (jobs, std::mem::take(&mut *lock(&self.mounts)))
        };

        let factory: EngineFactory =
            Box::new(move || factory().map(|engine| Box::new(engine) as Box<dyn Engine>));
        let (ready_tx, ready_rx) = mpsc::channel();
        let (exited_tx, exited_rx) = mpsc::channel();
        let launch = Launch {
            shared: Arc::clone(&self.shared),
            factory,
            paths: self.paths.clone(),
            mounts,
            jobs,
            ready: ready_tx,
            exited: exited_tx,
        };

        let spawned = std::thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || ui_thread::run(launch));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                let mut gate = lock(&self.shared.gate);
                gate.state = CoreState::Stopped;
                gate.sender = None;
                return Err(CoreError::Init(format!("failed to spawn UI thread: {e}")));
            }
        };
        *lock(&self.thread) = Some(handle);
        *lock(&self.exited) = Some(exited_rx);

        let timeout = self.config.start_timeout();
        match ready_rx.recv_timeout(timeout) {
            Ok(Ok(())) => {
                tracing::info!(thread = %self.config.thread_name, "core started");
                Ok(())
            }
            Ok(Err(e)) => {
                self.join_ui_thread();
                Err(e)
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(?timeout, "engine initialization timed out");
                self.shutdown();
                Err(CoreError::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.join_ui_thread();
                Err(CoreError::Init("UI thread exited during start".into()))
            }
        }
    }

    // =========================================================================
    // SUBMIT
    // =========================================================================

    /// Run `f` on the UI thread and return its result.
    pub fn submit<R, F>(&self, f: F) -> Result<R, CoreError>
    where
        R: Send + 'static,
        F: FnOnce(&mut UiContext) -> R + Send + 'static,
    {
        self.submit_with(&CancellationToken::new(), f)
    }

    /// Like `submit`, observing `token`.
    ///
    /// Cancelling before the job is dequeued skips it. Cancelling while it
    /// runs returns `Cancelled` to the caller; the job itself runs to
    /// completion and its result is discarded.
    pub fn submit_with<R, F>(&self, token: &CancellationToken, f: F) -> Result<R, CoreError>
    where
        R: Send + 'static,
        F: FnOnce(&mut UiContext) -> R + Send + 'static,
    {
        self.submit_or_reclaim(token, f, |_, _| {})
    }

    /// Like `submit_with`, for jobs whose result owns UI-thread resources.
    ///
    /// If the caller stops waiting (timeout or cancellation) before the
    /// result is handed over, `reclaim` receives it on the UI thread
    /// instead.
    pub(crate) fn submit_or_reclaim<R, F, G>(
        &self,
        token: &CancellationToken,
        f: F,
        reclaim: G,
    ) -> Result<R, CoreError>
    where
        R: Send + 'static,
        F: FnOnce(&mut UiContext) -> R + Send + 'static,
        G: FnOnce(&mut UiContext, R) + Send + 'static,
    {
        if self.is_ui_thread() {
            return Err(CoreError::Reentrant);
        }
        if token.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let job_token = token.child_token();
        let (reply_tx, reply_rx) = mpsc::channel::<Result<R, CoreError>>();
        let abandoned = Arc::new(Mutex::new(false));
        let handoff = Arc::clone(&abandoned);
        let id = new_correlation_id();
        let job = Job::new(
            id.clone(),
            job_token.clone(),
            Box::new(move |ctx: &mut UiContext| {
                let outcome =
                    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(ctx)))
                        .map_err(|payload| CoreError::JobPanicked(panic_message(payload.as_ref())));
                let gave_up = lock(&handoff);
                if !*gave_up {
                    let _ = reply_tx.send(outcome);
                    return;
                }
                drop(gave_up);
                if let Ok(value) = outcome {
                    reclaim(ctx, value);
                }
            }),
        );

        self.enqueue(Envelope::Job(job))?;
        self.await_reply(&id, &job_token, &abandoned, reply_rx)
    }

    /// Queue `f` without waiting for it.
    pub fn post<F>(&self, f: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut UiContext) + Send + 'static,
    {
        let job = Job::new(new_correlation_id(), CancellationToken::new(), Box::new(f));
        self.enqueue(Envelope::Job(job))
    }

    fn enqueue(&self, envelope: Envelope) -> Result<(), CoreError> {
        {
            let gate = lock(&self.shared.gate);
            match gate.state {
                CoreState::Idle => return Err(CoreError::NotInitialized),
                CoreState::ShuttingDown | CoreState::Stopped => return Err(CoreError::Terminated),
                CoreState::Starting | CoreState::Running => {}
            }
            let sender = gate.sender.as_ref().ok_or(CoreError::Terminated)?;
            sender.send(envelope).map_err(|_| CoreError::Terminated)?;
        }
        self.wake();
        Ok(())
    }

    fn await_reply<R>(
        &self,
        id: &str,
        token: &CancellationToken,
        abandoned: &Mutex<bool>,
        reply: Receiver<Result<R, CoreError>>,
    ) -> Result<R, CoreError> {
        // Marks the wait as over. A reply that beat the mark is still
        // returned; anything later goes to the job's reclaim path.
        let give_up = || {
            *lock(abandoned) = true;
            reply.try_recv().ok()
        };

        let timeout = self.config.submit_timeout();
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                token.cancel();
                if let Some(outcome) = give_up() {
                    return outcome;
                }
                tracing::warn!(job = %id, ?timeout, "job timed out");
                return Err(CoreError::Timeout(timeout));
            }
            match reply.recv_timeout((deadline - now).min(CANCEL_POLL_INTERVAL)) {
                Ok(outcome) => {
                    if let Err(e) = &outcome {
                        tracing::warn!(job = %id, error = %e, "job failed");
                    }
                    return outcome;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if token.is_cancelled() {
                        if let Some(outcome) = give_up() {
                            return outcome;
                        }
                        tracing::debug!(job = %id, "job cancelled by caller");
                        return Err(CoreError::Cancelled);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(if token.is_cancelled() {
                        CoreError::Cancelled
                    } else {
                        CoreError::Terminated
                    });
                }
            }
        }
    }

    fn wake(&self) {
        let waker = lock(&self.shared.waker).clone();
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    // =========================================================================
    // SHUTDOWN
    // =========================================================================

    /// Stop the UI thread: reject new jobs, let every job accepted before
    /// this call run, destroy remaining windows, shut the engine down.
    ///
    /// Waits up to the configured shutdown timeout. On the UI thread itself
    /// it only signals. Idempotent.
    pub fn shutdown(&self) {
        {
            let mut gate = lock(&self.shared.gate);
            match gate.state {
                CoreState::Idle => {
                    gate.state = CoreState::Stopped;
                    drop(gate);
                    self.shared.events.publish(CoreEvent::Stopped);
                    return;
                }
                CoreState::Starting | CoreState::Running => {
                    gate.state = CoreState::ShuttingDown;
                    if let Some(sender) = &gate.sender {
                        let _ = sender.send(Envelope::Shutdown);
                    }
                    tracing::info!("core shutting down");
                }
                CoreState::ShuttingDown | CoreState::Stopped => {}
            }
        }
        self.wake();

        if self.is_ui_thread() {
            return;
        }

        let exited = lock(&self.exited).take();
        if let Some(exited) = exited {
            let timeout = self.config.shutdown_timeout();
            match exited.recv_timeout(timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => self.join_ui_thread(),
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(?timeout, "UI thread did not exit in time; detaching");
                    lock(&self.thread).take();
                }
            }
        }
    }

    fn join_ui_thread(&self) {
        let handle = lock(&self.thread).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("UI thread panicked");
            }
        }
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        self.shutdown();
    }
}
