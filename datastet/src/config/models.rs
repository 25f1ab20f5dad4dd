//! Configuration model definitions.
//!
//! This module contains the configuration structures for every pipeline stage
//! and for the external services the pipeline consults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatastetConfig {
    /// Lexicon resources
    pub lexicon: LexiconConfig,

    /// Term propagation
    pub propagation: PropagationConfig,

    /// URL and citation attachment
    pub attachment: AttachmentConfig,

    /// Mention role classification
    pub context: ContextConfig,

    /// Sentence data-type classification
    pub datatype: DatatypeConfig,

    /// Entity linking service
    pub disambiguation: DisambiguationConfig,

    /// Bibliographic consolidation service
    pub consolidation: ConsolidationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Paths of the lexicon resources. Unset paths fall back to built-in lists.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LexiconConfig {
    /// Tab-separated `term<TAB>idf` table
    pub idf_file: Option<PathBuf>,

    /// One English stopword per line
    pub stopwords_file: Option<PathBuf>,

    /// One dataset DOI prefix per line
    pub doi_prefixes_file: Option<PathBuf>,

    /// One data repository domain per line
    pub url_domains_file: Option<PathBuf>,

    /// One blacklisted dataset name per line
    pub blacklist_file: Option<PathBuf>,
}

/// Term propagation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PropagationConfig {
    /// Whether recognised names are propagated to the rest of the document
    pub enabled: bool,

    /// Minimum tf-idf for a propagated mention with a known idf
    pub tfidf_threshold: f64,

    /// Confidence given to propagated mentions
    pub confidence: f64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tfidf_threshold: 0.001,
            confidence: 0.5,
        }
    }
}

/// Attachment settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AttachmentConfig {
    /// Characters allowed between a name (or the previous citation) and a citation marker
    pub citation_window: usize,

    /// Whether citations are copied to other mentions of the same name
    pub propagate_citations: bool,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            citation_window: 5,
            propagate_citations: true,
        }
    }
}

/// How the role classifier reports its scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    /// Three binary classifiers, each with a positive and a negative score
    Binary,
    /// One multi-label classifier with one score per role
    MultiLabel,
}

impl fmt::Display for ClassifierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierMode::Binary => write!(f, "binary"),
            ClassifierMode::MultiLabel => write!(f, "multilabel"),
        }
    }
}

impl FromStr for ClassifierMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binary" => Ok(ClassifierMode::Binary),
            "multilabel" | "multi-label" => Ok(ClassifierMode::MultiLabel),
            _ => Err(format!("Invalid classifier mode: {}", s)),
        }
    }
}

/// Mention role classification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContextConfig {
    pub enabled: bool,

    /// Base URL of the classification service
    pub url: String,

    pub mode: ClassifierMode,

    /// Probability above which a role is asserted
    pub decision_threshold: f64,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "http://localhost:8060".to_string(),
            mode: ClassifierMode::Binary,
            decision_threshold: 0.5,
            timeout_secs: 60,
        }
    }
}

/// Sentence data-type classification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatatypeConfig {
    pub enabled: bool,

    /// Base URL of the classification service
    pub url: String,

    /// Implicit datasets in sentences scoring below this are dropped
    pub has_dataset_threshold: f64,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DatatypeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "http://localhost:8060".to_string(),
            has_dataset_threshold: 0.5,
            timeout_secs: 60,
        }
    }
}

/// Entity linking settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisambiguationConfig {
    pub enabled: bool,

    /// Base URL of the entity linking service
    pub url: String,

    /// Name of the service-side customisation
    pub customisation: String,

    /// Minimum selection score requested from the service
    pub min_selector_score: f64,

    /// Language of the documents
    pub lang: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DisambiguationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "http://localhost:8090".to_string(),
            customisation: "dataset".to_string(),
            min_selector_score: 0.2,
            lang: "en".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Bibliographic consolidation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsolidationConfig {
    pub enabled: bool,

    /// Base URL of the lookup service
    pub url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,

    /// Log format
    pub format: LogFormat,

    /// File to log to (if any)
    pub file: Option<PathBuf>,

    /// Whether to log to the console (stderr)
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Default,
            file: None,
            console: true,
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level
    Trace,

    /// Debug level
    Debug,

    /// Info level
    Info,

    /// Warn level
    Warn,

    /// Error level
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Default format
    Default,

    /// JSON format
    Json,

    /// Compact format
    Compact,

    /// Pretty format
    Pretty,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Default => write!(f, "default"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Compact => write!(f, "compact"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(LogFormat::Default),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}
