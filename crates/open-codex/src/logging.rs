//! Tracing setup: quiet stderr output plus a per-run debug log file.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

/// Stderr stays silent unless `RUST_LOG` says otherwise.
const DEFAULT_STDERR_FILTER: &str = "error";
const RUN_LOG_FILTER: &str =
    "info,open_codex=debug,codex_agent=debug,codex_config=debug,codex_process=debug";

/// Create a log writer for this run.
///
/// Log files are created in `{state_dir}/logs/run-{timestamp}.log`. The
/// returned guard flushes the writer when dropped and must outlive logging.
pub fn create_run_log_writer(state_dir: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let log_dir = state_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_name = format!("run-{}.log", Utc::now().format("%Y%m%d-%H%M%S"));
    let file_appender = tracing_appender::rolling::never(&log_dir, file_name);
    Ok(tracing_appender::non_blocking(file_appender))
}

/// Install the global subscriber. A log file that cannot be created only
/// costs the file layer.
pub fn init(state_dir: &Path) -> Option<WorkerGuard> {
    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDERR_FILTER));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    let (file_layer, guard, file_error) = match create_run_log_writer(state_dir) {
        Ok((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(RUN_LOG_FILTER));
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .ok();

    if let Some(e) = file_error {
        tracing::warn!("run log disabled: {e:#}");
    }
    guard
}
