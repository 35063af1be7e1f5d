//! Tracing subscriber setup and structured telemetry events.

pub mod events;

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

const LOG_FILE_PREFIX: &str = "tagalog-core.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global stderr subscriber. Filter comes from `RUST_LOG`.
pub fn init_tracing() {
    let fmt_layer = fmt::layer().with_target(false);
    let subscriber = Registry::default().with(env_filter()).with(fmt_layer);

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("tracing subscriber already installed: {err}");
    }
}

/// Like [`init_tracing`], plus a daily-rolling JSON log under `log_dir`.
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// the lifetime of the process.
pub fn init_tracing_with_file(log_dir: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let stderr_layer = fmt::layer().with_target(false);
    let file_layer = fmt::layer().json().with_writer(writer);
    let subscriber = Registry::default()
        .with(env_filter())
        .with(stderr_layer)
        .with(file_layer);

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("tracing subscriber already installed: {err}");
    }
    guard
}
