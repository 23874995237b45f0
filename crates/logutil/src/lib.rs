//! Utilities for logging.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::MakeWriter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    HumanReadable,
    Json,
}

/// Install the global tracing subscriber.
///
/// `default_level` applies when `RUST_LOG` is unset. Logs are written to
/// `sink`, typically `io::stderr` so job output stays machine-readable.
pub fn configure_global_logger<W>(default_level: tracing::Level, format: LogFormat, sink: W)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level).into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(sink);

    match format {
        LogFormat::HumanReadable => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
