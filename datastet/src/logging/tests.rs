use crate::config::{LogFormat, LogLevel, LoggingConfig};
use crate::logging::{LogError, level_to_log_level, parse_log_level};
use std::sync::Once;
use tempfile::tempdir;

// Use this to ensure init is only called once across all tests
static INIT: Once = Once::new();

#[test]
fn test_init_console_logging() {
    INIT.call_once(|| {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            format: LogFormat::Compact,
            file: None,
            console: true,
        };

        let guard = crate::logging::init(&config).unwrap();
        assert!(guard.is_none());
    });
}

#[test]
fn test_init_without_sinks_is_noop() {
    let config = LoggingConfig {
        level: LogLevel::Info,
        format: LogFormat::Default,
        file: None,
        console: false,
    };

    assert!(crate::logging::init(&config).unwrap().is_none());
}

#[test]
fn test_file_writer_creates_parent_directory() {
    let temp_dir = tempdir().unwrap();
    let log_path = temp_dir.path().join("nested").join("datastet.log");

    let (_writer, _guard) = super::create_non_blocking_file(&log_path).unwrap();
    assert!(log_path.parent().unwrap().exists());
}

#[test]
fn test_level_conversion() {
    assert_eq!(parse_log_level("trace").unwrap(), LogLevel::Trace);
    assert_eq!(parse_log_level("DEBUG").unwrap(), LogLevel::Debug);
    assert_eq!(parse_log_level("info").unwrap(), LogLevel::Info);
    assert_eq!(parse_log_level("warn").unwrap(), LogLevel::Warn);
    assert_eq!(parse_log_level("error").unwrap(), LogLevel::Error);
    assert!(matches!(
        parse_log_level("invalid"),
        Err(LogError::InvalidLogLevel(_))
    ));

    assert_eq!(level_to_log_level(tracing::Level::TRACE), LogLevel::Trace);
    assert_eq!(level_to_log_level(tracing::Level::DEBUG), LogLevel::Debug);
    assert_eq!(level_to_log_level(tracing::Level::INFO), LogLevel::Info);
    assert_eq!(level_to_log_level(tracing::Level::WARN), LogLevel::Warn);
    assert_eq!(level_to_log_level(tracing::Level::ERROR), LogLevel::Error);
}
