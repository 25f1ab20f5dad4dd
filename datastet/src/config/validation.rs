//! Configuration validation utilities.
//!
//! This module provides validation functions for configuration values.

use super::ConfigError;
use super::models::*;

/// Validate the entire configuration.
pub fn validate_config(config: &DatastetConfig) -> Result<(), ConfigError> {
    validate_lexicon_config(&config.lexicon)?;
    validate_propagation_config(&config.propagation)?;

    validate_probability("context.decision_threshold", config.context.decision_threshold)?;
    validate_probability(
        "datatype.has_dataset_threshold",
        config.datatype.has_dataset_threshold,
    )?;
    validate_probability(
        "disambiguation.min_selector_score",
        config.disambiguation.min_selector_score,
    )?;

    validate_service("context", config.context.enabled, &config.context.url, config.context.timeout_secs)?;
    validate_service(
        "datatype",
        config.datatype.enabled,
        &config.datatype.url,
        config.datatype.timeout_secs,
    )?;
    validate_service(
        "disambiguation",
        config.disambiguation.enabled,
        &config.disambiguation.url,
        config.disambiguation.timeout_secs,
    )?;
    validate_service(
        "consolidation",
        config.consolidation.enabled,
        &config.consolidation.url,
        config.consolidation.timeout_secs,
    )?;

    if config.disambiguation.enabled && config.disambiguation.customisation.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Disambiguation customisation cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Lexicon files that are named must exist.
fn validate_lexicon_config(config: &LexiconConfig) -> Result<(), ConfigError> {
    let files = [
        ("idf_file", &config.idf_file),
        ("stopwords_file", &config.stopwords_file),
        ("doi_prefixes_file", &config.doi_prefixes_file),
        ("url_domains_file", &config.url_domains_file),
        ("blacklist_file", &config.blacklist_file),
    ];

    for (name, path) in files {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::ValidationError(format!(
                    "Lexicon {} not found: {}",
                    name,
                    path.display()
                )));
            }
        }
    }

    Ok(())
}

fn validate_propagation_config(config: &PropagationConfig) -> Result<(), ConfigError> {
    if !config.tfidf_threshold.is_finite() || config.tfidf_threshold < 0.0 {
        return Err(ConfigError::ValidationError(
            "Propagation tf-idf threshold must be a non-negative number".to_string(),
        ));
    }

    validate_probability("propagation.confidence", config.confidence)
}

fn validate_probability(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ValidationError(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_service(name: &str, enabled: bool, url: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if !enabled {
        return Ok(());
    }

    let url = url.trim();
    if url.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "Service URL is required for the {} service",
            name
        )));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "Service URL for the {} service must be http(s): {}",
            name, url
        )));
    }
    if timeout_secs == 0 {
        return Err(ConfigError::ValidationError(format!(
            "Timeout for the {} service must be positive",
            name
        )));
    }

    Ok(())
}
