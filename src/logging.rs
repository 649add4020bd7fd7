//! Logging initialization.
//!
//! Console output always; an additional daily-rotating file appender when a
//! log directory is configured. The filter honors `RUST_LOG` and falls back
//! to [`DEFAULT_LOG_FILTER`].

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "vidhive=info,sqlx=warn,tower_http=info";

/// Initialize the tracing subscriber.
///
/// Returns the file appender's worker guard when file logging is enabled;
/// keep it alive for the lifetime of the process.
pub fn init_logging(log_dir: Option<&str>) -> crate::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(true));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "vidhive.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            registry
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .try_init()
                .map_err(subscriber_error)?;
            Ok(Some(guard))
        }
        None => {
            registry.try_init().map_err(subscriber_error)?;
            Ok(None)
        }
    }
}

fn subscriber_error(e: impl std::fmt::Display) -> crate::Error {
    crate::Error::Other(format!("Failed to set global default subscriber: {e}"))
}
