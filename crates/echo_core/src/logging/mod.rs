//! Logging infrastructure for Echo Ranger.
//!
//! Library code logs through the `tracing` macros only. Binaries call one of
//! the init functions once at startup:
//!
//! ```no_run
//! use echo_core::logging::{init_tracing_with_file, LogLevel};
//!
//! // Keep the guard alive until exit so buffered lines reach the file
//! let _guard = init_tracing_with_file(LogLevel::Info, ".logs");
//! tracing::info!("ready");
//! ```

mod types;

pub use types::LogLevel;

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// File name prefix for daily log files.
pub const LOG_FILE_PREFIX: &str = "echo-ranger.log";

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(env_filter(default_level))
        .init();
}

/// Initialize tracing with an additional daily log file in `logs_dir`.
///
/// The returned guard flushes the non-blocking writer when dropped.
pub fn init_tracing_with_file(default_level: LogLevel, logs_dir: impl AsRef<Path>) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(logs_dir.as_ref(), LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file_writer),
        )
        .with(env_filter(default_level))
        .init();

    guard
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter(default_level))
}

fn fallback_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level_filter(level).into())
        .parse_lossy("")
}

/// Convert LogLevel to a subscriber level filter.
pub fn level_filter(level: LogLevel) -> LevelFilter {
    LevelFilter::from_level(level.to_tracing_level())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_filter_matches_log_level() {
        assert_eq!(level_filter(LogLevel::Debug), LevelFilter::DEBUG);
        assert_eq!(level_filter(LogLevel::Info), LevelFilter::INFO);
        assert_eq!(level_filter(LogLevel::Error), LevelFilter::ERROR);
    }

    #[test]
    fn default_filter_admits_configured_level() {
        let filter = fallback_filter(LogLevel::Warn);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_tracing_can_be_installed_twice() {
        init_test_tracing();
        init_test_tracing();
        tracing::warn!("visible in test output");
    }
}
