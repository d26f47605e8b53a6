//! File logging. The terminal belongs to the UI, so nothing is written to stdout/stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_PREFIX: &str = "jirato";

pub fn logs_dir(config_dir: &Path) -> PathBuf {
    config_dir.join("logs")
}

/// Install a daily-rotated file subscriber. Keep the guard alive for the
/// lifetime of the program or buffered lines are lost.
pub fn setup_logging(config_dir: &Path) -> Result<WorkerGuard> {
    let dir = logs_dir(config_dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(7)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .build(&dir)
        .context("Failed to create log file appender")?;
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(writer);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(guard)
}
