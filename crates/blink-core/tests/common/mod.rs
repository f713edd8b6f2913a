#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use blink_config::schema::RuntimeConfig;
use blink_core::{Core, EnginePaths, HeadlessEngine, HeadlessHandle};

pub fn runtime() -> RuntimeConfig {
    RuntimeConfig {
        submit_timeout_ms: 5_000,
        start_timeout_ms: 5_000,
        shutdown_timeout_ms: 5_000,
        ..Default::default()
    }
}

pub fn paths() -> EnginePaths {
    EnginePaths::new("blink.dll", "/tmp/blink-tests", "/tmp/blink-tests/cookie.dat")
}

/// A running core over a fresh headless engine.
pub fn start_headless() -> (Arc<Core>, HeadlessHandle) {
    start_with(runtime())
}

pub fn start_with(config: RuntimeConfig) -> (Arc<Core>, HeadlessHandle) {
    let engine = HeadlessEngine::new();
    let handle = engine.handle();
    let core = Arc::new(Core::new(config, paths()));
    core.start(move || Ok(engine)).expect("core should start");
    (core, handle)
}

/// Poll `cond` until it holds or two seconds pass.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

/// Kind used for flush markers; nothing in the crate handles it.
pub const FLUSH: blink_common::MessageKind = blink_common::MessageKind(0x7f00);

/// Block until every message posted before this call has been routed.
///
/// Messages are delivered in order, so once a marker posted after them
/// reaches default dispatch, the earlier ones have been handled.
pub fn flush_messages(handle: &HeadlessHandle) {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static NEXT: AtomicUsize = AtomicUsize::new(1);

    let marker = blink_common::Message::new(blink_common::WindowId(-1), FLUSH)
        .with_params(NEXT.fetch_add(1, Ordering::SeqCst), 0);
    handle.post_message(marker);
    let seen = wait_until(|| {
        handle.count_calls(|c| *c == blink_core::EngineCall::Dispatch(marker)) == 1
    });
    assert!(seen, "flush marker was never dispatched");
}
