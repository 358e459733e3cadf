use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes logging with both console and file output.
///
/// The console gets human-readable lines; `logs/tasker.log` gets JSON, rotated daily.
/// `RUST_LOG` overrides the default `tasker=info` level.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "tasker.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stdout);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tasker=info"));

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    // Keep the writer alive so buffered lines are flushed on exit
    std::mem::forget(guard);
}
