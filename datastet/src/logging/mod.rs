//! Structured logging infrastructure for Datastet.
//!
//! Logging is built on `tracing`. Console output goes to stderr so that
//! processed documents written to stdout stay machine readable. The
//! `DATASTET_LOG` environment variable, in `EnvFilter` syntax, overrides the
//! configured level.

#[cfg(test)]
mod tests;

use crate::config::{LogFormat, LogLevel, LoggingConfig};
use std::path::Path;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Environment variable holding a filter directive that overrides the configured level
pub const LOG_ENV_VAR: &str = "DATASTET_LOG";

/// Error type for logging operations
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing log level
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Error in subscriber setup
    #[error("Subscriber error: {0}")]
    SubscriberError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for logging operations
pub type Result<T> = std::result::Result<T, LogError>;

/// Initialize the logging system with the given configuration.
///
/// When logging to a file the returned guard must be kept alive, otherwise
/// buffered lines are lost. A second initialization is a no-op.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (writer, guard) = match (&config.file, config.console) {
        (Some(path), false) => {
            let (writer, guard) = create_non_blocking_file(path)?;
            (BoxMakeWriter::new(writer), Some(guard))
        }
        (Some(path), true) => {
            tracing::debug!(
                file = %path.display(),
                "Console logging enabled; file logging ignored"
            );
            (BoxMakeWriter::new(std::io::stderr), None)
        }
        (None, true) => (BoxMakeWriter::new(std::io::stderr), None),
        (None, false) => return Ok(None),
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(to_tracing_level(config.level)).into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    let result = match config.format {
        LogFormat::Json => builder.json().with_line_number(true).try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().with_line_number(true).try_init(),
        LogFormat::Default => builder.try_init(),
    };

    match result {
        Ok(()) => Ok(guard),
        Err(e) if e.to_string().contains("SetGlobalDefaultError") => Ok(guard),
        Err(e) if e.to_string().contains("global default trace dispatcher") => Ok(guard),
        Err(e) => Err(LogError::SubscriberError(e)),
    }
}

/// Create a non-blocking file writer.
fn create_non_blocking_file(
    path: impl AsRef<Path>,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(".")),
        path.file_name().unwrap_or_default(),
    );

    Ok(tracing_appender::non_blocking(file_appender))
}

/// Parse a log level string into a LogLevel enum.
pub fn parse_log_level(level: &str) -> Result<LogLevel> {
    level
        .parse()
        .map_err(|_| LogError::InvalidLogLevel(level.to_string()))
}

fn to_tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

/// Convert a tracing::Level to a LogLevel enum.
pub fn level_to_log_level(level: Level) -> LogLevel {
    match level {
        Level::TRACE => LogLevel::Trace,
        Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warn,
        Level::ERROR => LogLevel::Error,
    }
}
