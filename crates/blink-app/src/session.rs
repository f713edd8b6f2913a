//! One demo session: start the core, open a window, wait until it closes.

use std::sync::Arc;
use std::time::Duration;

use blink_common::{BlinkError, CoreEvent, WindowId};
use blink_config::schema::BlinkConfig;
use blink_core::{Core, HeadlessEngine, WebView, WindowOptions};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::boot::Boot;
use crate::cli::Args;

const WELCOME_HTML: &str = "<!doctype html><html><head><title>blink</title></head>\
<body><h1>blink</h1><p>Engine running on its UI thread.</p></body></html>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    WindowClosed,
    CoreStopped,
    Interrupted,
}

/// Window options from config, with command-line overrides applied.
pub fn window_options(config: &BlinkConfig, args: &Args) -> WindowOptions {
    let mut options = WindowOptions::from(&config.window);
    if let Some(title) = &args.title {
        options = options.with_title(title);
    }
    if let Some(url) = &args.url {
        options = options.with_url(url);
    }
    options
}

pub fn run(config: &BlinkConfig, args: &Args, boot: &Boot) -> Result<ExitReason, BlinkError> {
    let engine = HeadlessEngine::new();
    let handle = engine.handle();
    let core = Arc::new(Core::from_config(config, boot.paths.module.clone()));
    let events = core.subscribe();
    core.start(move || Ok(engine))?;

    let options = window_options(config, args);
    let has_url = options.url.is_some();
    let view = WebView::create(&core, options)?;
    if !has_url {
        view.load_html(WELCOME_HTML)?;
    }
    view.move_to_center()?;
    view.show()?;
    view.on_close(|window| {
        tracing::info!(%window, "close requested");
        true
    });
    let window = view.window_id();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let reason = rt.block_on(async {
        if let Some(secs) = args.close_after {
            let handle = handle.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                tracing::info!(%window, "closing window after {secs}s");
                handle.close_window(window);
            });
        }
        wait_for_exit(events, window).await
    });
    tracing::info!(?reason, "session ending");

    drop(view);
    core.shutdown();
    Ok(reason)
}

/// Wait for the session window to go away, the core to stop, or Ctrl-C.
pub async fn wait_for_exit(
    mut events: broadcast::Receiver<CoreEvent>,
    window: WindowId,
) -> ExitReason {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => return ExitReason::Interrupted,
            event = events.recv() => match event {
                Ok(CoreEvent::WindowDestroyed(id)) if id == window => {
                    return ExitReason::WindowClosed;
                }
                Ok(CoreEvent::Stopped) | Err(RecvError::Closed) => {
                    return ExitReason::CoreStopped;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "core event receiver lagged");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blink_common::EventBus;
    use clap::Parser;

    #[test]
    fn cli_overrides_config_window() {
        let config = BlinkConfig::default();
        let args = Args::try_parse_from(["blink", "--title", "docs", "--url", "about:blank"]).unwrap();
        let options = window_options(&config, &args);
        assert_eq!(options.title, "docs");
        assert_eq!(options.url.as_deref(), Some("about:blank"));
        assert_eq!(options.width, config.window.width);
    }

    #[tokio::test]
    async fn exit_on_own_window_destroyed() {
        let bus = EventBus::new(8);
        let rx = bus.subscribe();
        bus.publish(CoreEvent::WindowDestroyed(WindowId(2)));
        bus.publish(CoreEvent::WindowDestroyed(WindowId(1001)));
        assert_eq!(
            wait_for_exit(rx, WindowId(1001)).await,
            ExitReason::WindowClosed
        );
    }

    #[tokio::test]
    async fn exit_when_core_stops() {
        let bus = EventBus::new(8);
        let rx = bus.subscribe();
        bus.publish(CoreEvent::Stopped);
        assert_eq!(
            wait_for_exit(rx, WindowId(1001)).await,
            ExitReason::CoreStopped
        );
    }

    #[test]
    fn session_ends_when_window_closes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BlinkConfig::default();
        config.engine.work_dir = Some(dir.path().to_path_buf());
        config.devtools.enabled = false;
        let args = Args::try_parse_from(["blink", "--close-after", "0"]).unwrap();

        let boot = crate::boot::prepare(&config, None).unwrap();
        let reason = run(&config, &args, &boot).unwrap();
        assert_eq!(reason, ExitReason::WindowClosed);
    }
}
