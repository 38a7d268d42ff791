use anyhow::{Context, Result};
use metrics::counter;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default log filter when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "bmi_api=info,tower_http=info";

/// Initialize structured logging and metrics collection
///
/// Log lines go to stdout and to an append-only file inside `log_dir`.
/// The returned guard flushes the file writer and must be held for the
/// lifetime of the process.
pub fn init_logging_and_metrics(log_dir: &Path, log_file: &str) -> Result<WorkerGuard> {
    // Create the append-only log file writer
    let appender = file_appender(log_dir, log_file)?;
    // Lines are dropped rather than blocking a request when the writer falls behind
    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    // Set up environment filter for log levels
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    // Initialize tracing subscriber with stdout and file output
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stdout),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .context("Failed to install the global tracing subscriber")?;
    // Output debugging information
    info!(
        log_dir = %log_dir.display(),
        log_file = log_file,
        "Logging and tracing initialized"
    );
    // Initialize metrics with default values
    counter!("bmi_api.total_requests").absolute(0);
    counter!("bmi_api.total_calculations").absolute(0);
    counter!("bmi_api.total_errors").absolute(0);
    counter!("bmi_api.total_internal_errors").absolute(0);
    // Output debugging information
    info!("Metrics collection initialized");
    // Return the flush guard
    Ok(guard)
}

/// Create the log directory if needed and open a never-rotating file appender
fn file_appender(log_dir: &Path, log_file: &str) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(log_file)
        .build(log_dir)
        .with_context(|| format!("Failed to open log file {log_file} in {}", log_dir.display()))
}
