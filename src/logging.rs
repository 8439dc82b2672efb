// src/logging.rs

//! Logging setup for `flowdag` using `tracing` + `tracing-subscriber`.
//!
//! The scheduler itself only emits `tracing` events; embedders that already
//! install their own subscriber should skip this module entirely.
//!
//! Priority for determining the log level:
//! 1. explicit `level` argument (if provided)
//! 2. `FLOWDAG_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`

use tracing_subscriber::fmt;

/// Initialise a global logging subscriber.
///
/// Safe to call once at startup (a second call panics, like any
/// `fmt().init()` setup).
pub fn init_logging(level: Option<tracing::Level>) {
    let level = level
        .or_else(env_level)
        .unwrap_or(tracing::Level::INFO);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}

/// Level named by `FLOWDAG_LOG`, if set and parseable. `tracing::Level`
/// already accepts the usual case-insensitive names.
fn env_level() -> Option<tracing::Level> {
    let raw = std::env::var("FLOWDAG_LOG").ok()?;
    raw.trim().parse().ok()
}
