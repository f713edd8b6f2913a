//! Boot sequence: work directory, stale staging sweep, payload staging.
//!
//! Produces the engine paths the core initializes with. The staged payload
//! (if any) must outlive the core; dropping it removes its directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use blink_common::BlinkError;
use blink_config::schema::BlinkConfig;
use blink_core::{stage_payload, sweep_stale, EnginePaths, StagedPayload};

pub struct Boot {
    pub paths: EnginePaths,
    pub staged: Option<StagedPayload>,
}

/// Prepare the work directory and decide which engine module to load.
///
/// With `payload`, its bytes are staged into a fresh directory and that
/// copy is loaded. Otherwise the configured `module_path` is used, falling
/// back to `<work_dir>/<file_name>`.
pub fn prepare(config: &BlinkConfig, payload: Option<&Path>) -> Result<Boot, BlinkError> {
    let work_dir = blink_config::paths::work_dir(&config.engine);
    std::fs::create_dir_all(&work_dir)?;

    let removed = sweep_stale(
        &work_dir,
        &config.staging.prefix,
        Duration::from_secs(config.staging.stale_after_secs),
        None,
    );
    if !removed.is_empty() {
        tracing::info!(count = removed.len(), "swept stale staging directories");
    }

    let staged = match payload {
        Some(source) => {
            let bytes = std::fs::read(source)?;
            Some(stage_payload(
                &work_dir,
                &config.staging.prefix,
                &config.staging.file_name,
                &bytes,
            )?)
        }
        None => None,
    };

    let module: PathBuf = match (&staged, &config.engine.module_path) {
        (Some(staged), _) => staged.path().to_path_buf(),
        (None, Some(configured)) => configured.clone(),
        (None, None) => work_dir.join(&config.staging.file_name),
    };
    tracing::debug!(module = %module.display(), "engine module resolved");

    Ok(Boot {
        paths: EnginePaths::from_config(&config.engine, module),
        staged,
    })
}
