mod boot;
mod cli;
mod session;

use blink_common::ConfigError;
use blink_config::schema::BlinkConfig;
use tracing_subscriber::EnvFilter;

fn load_config(args: &cli::Args) -> Result<BlinkConfig, ConfigError> {
    match &args.config {
        Some(path) => blink_config::load_config_from(path),
        None => blink_config::load_config(),
    }
}

fn init_logging(directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                directive
                    .parse()
                    .unwrap_or_else(|_| "blink=info".parse().expect("static directive")),
            ),
        )
        .init();
}

fn main() {
    let args = cli::parse();

    // Config decides the default log level, so load it before logging
    // starts and report any failure afterwards.
    let loaded = load_config(&args);
    let directive = args.log_level.clone().unwrap_or_else(|| match &loaded {
        Ok(config) => format!("blink={}", config.logging.level.as_directive()),
        Err(_) => "blink=info".to_string(),
    });
    init_logging(&directive);

    tracing::info!("blink v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        BlinkConfig::default()
    });
    tracing::debug!(config = %blink_config::config_to_json(&config), "effective config");

    let boot = match boot::prepare(&config, args.payload.as_deref()) {
        Ok(boot) => boot,
        Err(e) => {
            tracing::error!("Boot failed: {e}");
            std::process::exit(1);
        }
    };

    let result = session::run(&config, &args, &boot);
    // The staged payload goes only after the core has shut down.
    drop(boot);

    match result {
        Ok(reason) => tracing::info!(?reason, "Shutdown complete"),
        Err(e) => {
            tracing::error!("Session failed: {e}");
            std::process::exit(1);
        }
    }
}
