//! Configuration builder.
//!
//! This module provides a builder pattern API for creating configurations.

use super::{Result, models::*, validation};
use std::path::{Path, PathBuf};

/// Builder for creating DatastetConfig instances.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: DatastetConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self {
            config: DatastetConfig::default(),
        }
    }

    /// Read the idf table from a file.
    pub fn with_idf_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.lexicon.idf_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read the stopword list from a file.
    pub fn with_stopwords_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.lexicon.stopwords_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read the dataset name blacklist from a file.
    pub fn with_blacklist_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.lexicon.blacklist_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use lexicon files found under `~/.datastet/lexicon`, if any.
    pub fn with_default_lexicon(mut self) -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let dir = home_dir.join(".datastet").join("lexicon");
        let existing = |name: &str| {
            let path = dir.join(name);
            path.exists().then_some(path)
        };

        let lexicon = &mut self.config.lexicon;
        lexicon.idf_file = lexicon.idf_file.take().or_else(|| existing("idf.tsv"));
        lexicon.stopwords_file = lexicon
            .stopwords_file
            .take()
            .or_else(|| existing("stopwords.txt"));
        lexicon.doi_prefixes_file = lexicon
            .doi_prefixes_file
            .take()
            .or_else(|| existing("doi_prefixes.txt"));
        lexicon.url_domains_file = lexicon
            .url_domains_file
            .take()
            .or_else(|| existing("url_domains.txt"));
        lexicon.blacklist_file = lexicon
            .blacklist_file
            .take()
            .or_else(|| existing("blacklist.txt"));
        self
    }

    /// Enable or disable term propagation.
    pub fn with_propagation(mut self, enabled: bool) -> Self {
        self.config.propagation.enabled = enabled;
        self
    }

    /// Set the tf-idf acceptance threshold for propagated mentions.
    pub fn with_tfidf_threshold(mut self, threshold: f64) -> Self {
        self.config.propagation.tfidf_threshold = threshold;
        self
    }

    /// Set the citation attachment window.
    pub fn with_citation_window(mut self, window: usize) -> Self {
        self.config.attachment.citation_window = window;
        self
    }

    /// Use a remote role classifier.
    pub fn with_context_service(mut self, url: impl Into<String>, mode: ClassifierMode) -> Self {
        self.config.context.enabled = true;
        self.config.context.url = url.into();
        self.config.context.mode = mode;
        self
    }

    /// Use a remote data-type classifier.
    pub fn with_datatype_service(mut self, url: impl Into<String>) -> Self {
        self.config.datatype.enabled = true;
        self.config.datatype.url = url.into();
        self
    }

    /// Use a remote entity linking service.
    pub fn with_disambiguation_service(mut self, url: impl Into<String>) -> Self {
        self.config.disambiguation.enabled = true;
        self.config.disambiguation.url = url.into();
        self
    }

    /// Use a remote bibliographic lookup service.
    pub fn with_consolidation_service(mut self, url: impl Into<String>) -> Self {
        self.config.consolidation.enabled = true;
        self.config.consolidation.url = url.into();
        self
    }

    /// Disable every remote service.
    pub fn offline(mut self) -> Self {
        self.config.context.enabled = false;
        self.config.datatype.enabled = false;
        self.config.disambiguation.enabled = false;
        self.config.consolidation.enabled = false;
        self
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Set the log format.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    /// Configure logging to a file.
    pub fn with_log_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.logging.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Create a configuration for development: no services, debug logging.
    pub fn development() -> Self {
        Self::new()
            .offline()
            .with_default_lexicon()
            .with_log_level(LogLevel::Debug)
    }

    /// Create a configuration for automated tests: no services, built-in lexicon.
    pub fn testing() -> Self {
        Self::new().offline().with_log_level(LogLevel::Warn)
    }

    /// Create a configuration that talks to locally running services.
    ///
    /// Classification runs on port 8060, entity linking on 8090 and
    /// bibliographic lookup on 8080.
    pub fn production() -> Self {
        let defaults = DatastetConfig::default();
        Self::new()
            .with_default_lexicon()
            .with_context_service(defaults.context.url, ClassifierMode::Binary)
            .with_datatype_service(defaults.datatype.url)
            .with_disambiguation_service(defaults.disambiguation.url)
            .with_consolidation_service(defaults.consolidation.url)
            .with_log_format(LogFormat::Json)
    }

    /// Build the configuration, validating it in the process.
    pub fn build(self) -> Result<DatastetConfig> {
        validation::validate_config(&self.config)?;

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
