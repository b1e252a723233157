use crate::constants::{APP_DIR, LOG_ENV, LOG_FILE};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Logs go to a file so they never tear the terminal UI. The level comes from
/// `XCLEANER_LOG`, falling back to `info` (`debug` with `--verbose`).
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init_logger(verbose: bool) -> Option<WorkerGuard> {
    let log_dir = dirs::cache_dir()?.join(APP_DIR);
    if std::fs::create_dir_all(&log_dir).is_err() {
        return None;
    }

    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter)
        .init();

    tracing::info!("logging to {}", log_dir.join(LOG_FILE).display());
    Some(guard)
}
