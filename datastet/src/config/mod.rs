//! Configuration system for Datastet.
//!
//! Configuration can be loaded from files and environment variables, or put
//! together in code with [`ConfigBuilder`]. Every path ends in validation.

mod builder;
mod loader;
mod models;
#[cfg(test)]
mod tests;
mod validation;

pub use builder::ConfigBuilder;
pub use loader::ConfigLoader;
pub use models::*;

/// Default configuration file names that the system will look for
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "datastet.toml",
    "datastet.yaml",
    "datastet.yml",
    "datastet.json",
    ".datastet/config.toml",
    ".datastet/config.yaml",
    ".datastet/config.yml",
    ".datastet/config.json",
];

/// Environment variable prefix for Datastet configuration.
///
/// Nested keys are separated by a double underscore, e.g.
/// `DATASTET_PROPAGATION__TFIDF_THRESHOLD`.
pub const ENV_PREFIX: &str = "DATASTET_";

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error occurred during file loading
    #[error("Failed to load configuration file: {0}")]
    FileLoadError(String),

    /// Error occurred during environment loading
    #[error("Failed to load environment variables: {0}")]
    EnvLoadError(String),

    /// Error occurred during validation
    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    /// Error occurred during parsing
    #[error("Configuration parsing error: {0}")]
    ParseError(String),

    /// General error
    #[error("{0}")]
    Other(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
