//! Logging setup
//!
//! Every run writes to a rolling file under `log_dir`. Text mode also echoes
//! to stderr so stdout carries nothing but the final verdict line.

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::HarnessConfig;

/// Map the `rotation` config value to an appender rotation. Unknown values
/// mean a single file.
pub fn rotation_for(name: &str) -> Rotation {
    match name.to_ascii_lowercase().as_str() {
        "minutely" => Rotation::MINUTELY,
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    }
}

/// `RUST_LOG` wins over `log_level`. A `log_level` that does not parse
/// falls back to `info`.
fn filter_for(config: &HarnessConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn file_writer(config: &HarnessConfig) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(
        rotation_for(&config.rotation),
        &config.log_dir,
        &config.log_file,
    );
    tracing_appender::non_blocking(appender)
}

/// Install the global subscriber. Keep the guard alive until exit so the
/// file writer can flush.
pub fn init_logging(config: &HarnessConfig) -> WorkerGuard {
    let (writer, guard) = file_writer(config);
    let registry = tracing_subscriber::registry().with(filter_for(config));

    if config.use_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(writer).with_ansi(false))
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }

    guard
}
