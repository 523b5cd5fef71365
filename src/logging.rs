// src/logging.rs

//! Logging setup for `taskgraph` using `tracing` + `tracing-subscriber`.
//!
//! A library must not install global state an embedding application did not
//! ask for, so every span and event the scheduler emits goes through the
//! `tracing` facade unconditionally; this module only offers an optional,
//! opt-in subscriber for applications that have none of their own.
//!
//! Verbosity is controlled by a single environment variable, `ARTRON_LEVEL`,
//! default `ERROR`. Unrecognised values fall back to the default rather than
//! erroring.

use anyhow::Result;
use tracing_subscriber::fmt;

const ENV_VAR: &str = "ARTRON_LEVEL";

/// Initialise a global `tracing` subscriber honoring `ARTRON_LEVEL`.
///
/// Safe to call once at startup. Intended for binaries embedding this crate
/// that do not already run their own subscriber.
pub fn init_logging() -> Result<()> {
    let level = std::env::var(ENV_VAR)
        .ok()
        .and_then(|s| parse_level_str(&s))
        .unwrap_or(tracing::Level::ERROR);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
