//! Units of work carried from caller threads to the UI thread.

use std::panic::{self, AssertUnwindSafe};

use tokio_util::sync::CancellationToken;

use crate::ui_thread::UiContext;

pub(crate) type JobFn = Box<dyn FnOnce(&mut UiContext) + Send>;

/// One queued closure plus the bookkeeping needed to skip or trace it.
pub(crate) struct Job {
    id: String,
    token: CancellationToken,
    run: JobFn,
}

impl Job {
    pub(crate) fn new(id: String, token: CancellationToken, run: JobFn) -> Self {
        Self { id, token, run }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    /// Run the job unless it was cancelled while queued. A panic is caught
    /// and logged so the loop survives it.
    pub(crate) fn run_isolated(self, ctx: &mut UiContext) {
        let Job { id, token, run } = self;
        if token.is_cancelled() {
            tracing::debug!(job = %id, "skipping cancelled job");
            return;
        }
        tracing::debug!(job = %id, "running job");
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| run(ctx))) {
            tracing::warn!(
                job = %id,
                panic = %crate::panic_message(payload.as_ref()),
                "job panicked"
            );
        }
    }
}

/// What travels on the job channel.
pub(crate) enum Envelope {
    Job(Job),
    /// Totally orders shutdown after every job accepted before it.
    Shutdown,
}
