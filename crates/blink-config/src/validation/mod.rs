//! Full configuration validation.
//!
//! Validates numeric ranges, required names, and mount uniqueness, and
//! collects every problem into a single `ConfigError`.

mod helpers;


use std::collections::HashSet;

use crate::schema::BlinkConfig;
use blink_common::ConfigError;

use helpers::{validate_non_empty, validate_range};

const MAX_WAIT_MS: u64 = 600_000;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &BlinkConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_runtime(&mut errors, config);
    validate_engine(&mut errors, config);
    validate_window(&mut errors, config);
    validate_mounts(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_runtime(errors: &mut Vec<String>, config: &BlinkConfig) {
    let rt = &config.runtime;
    validate_non_empty(errors, "core.thread_name", &rt.thread_name);
    validate_range(errors, "core.submit_timeout_ms", rt.submit_timeout_ms, 1, MAX_WAIT_MS);
    validate_range(errors, "core.start_timeout_ms", rt.start_timeout_ms, 1, MAX_WAIT_MS);
    validate_range(
        errors,
        "core.shutdown_timeout_ms",
        rt.shutdown_timeout_ms,
        1,
        MAX_WAIT_MS,
    );
    validate_range(errors, "core.event_capacity", rt.event_capacity, 1, 4096);
}

fn validate_engine(errors: &mut Vec<String>, config: &BlinkConfig) {
    validate_non_empty(errors, "engine.cookie_file", &config.engine.cookie_file);
    validate_non_empty(errors, "staging.prefix", &config.staging.prefix);
    validate_non_empty(errors, "staging.file_name", &config.staging.file_name);
    if config.staging.file_name.contains(['/', '\\']) {
        errors.push("staging.file_name must be a bare file name".to_string());
    }
    validate_range(
        errors,
        "staging.stale_after_secs",
        config.staging.stale_after_secs,
        60,
        2_592_000,
    );
}

fn validate_window(errors: &mut Vec<String>, config: &BlinkConfig) {
    validate_range(errors, "window.width", config.window.width, 100, 16_384);
    validate_range(errors, "window.height", config.window.height, 100, 16_384);
}

fn validate_mounts(errors: &mut Vec<String>, config: &BlinkConfig) {
    let mut seen = HashSet::new();
    if config.devtools.enabled {
        validate_non_empty(errors, "devtools.mount", &config.devtools.mount);
        seen.insert(config.devtools.mount.as_str());
    }
    for fs in &config.filesystems {
        validate_non_empty(errors, "filesystems.mount", &fs.mount);
        if !seen.insert(fs.mount.as_str()) {
            errors.push(format!("filesystems.mount '{}' is mounted twice", fs.mount));
        }
    }
}
