//! Tracing setup: console plus a daily rotating log file.
//!
//! [`init`] is called once at startup and returns a [`LogGuard`]. The file
//! layer writes through a background worker; keep the guard alive until the
//! process ends so buffered lines are flushed.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LOG_FILE_PREFIX;
use crate::error::{AppError, Result};

/// Keeps the file writer alive.
#[must_use = "dropping the guard stops the log file writer"]
pub struct LogGuard {
    _file: WorkerGuard,
}

/// Install the global subscriber.
///
/// Lines go to stderr and to `<log_dir>/dlt_crawler.YYYY-MM-DD.log`. The
/// level comes from `RUST_LOG`, `info` by default.
pub fn init(log_dir: &Path) -> Result<LogGuard> {
    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| AppError::Logging(e.to_string()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_timer(UtcTime::rfc_3339()),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true)
                .with_timer(UtcTime::rfc_3339()),
        )
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(LogGuard { _file: guard })
}

/// Console-only fallback when the log directory is unusable.
pub fn init_console() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(UtcTime::rfc_3339())
        .try_init();
}
