use datastet::config::{LogLevel, LoggingConfig};
use datastet::model::{ComponentType, Document};
use datastet::{DatastetError, Result};
use std::path::Path;

/// Read a document from a JSON file.
pub fn read_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        DatastetError::InvalidDocument(format!("{}: {}", path.display(), e))
    })
}

/// The configured logging section with the command line overrides applied.
///
/// Quiet and machine modes only report errors so stdout consumers see clean
/// output; verbose lowers the level to debug.
pub fn logging_config(base: &LoggingConfig, verbose: bool, quiet: bool) -> LoggingConfig {
    let mut config = base.clone();
    if quiet {
        config.level = LogLevel::Error;
    } else if verbose {
        config.level = LogLevel::Debug;
    }
    config
}

pub fn parse_mention_type(type_str: &str) -> Result<ComponentType> {
    match type_str {
        "dataset-name" | "name" | "named" => Ok(ComponentType::DatasetName),
        "dataset" | "implicit" => Ok(ComponentType::Dataset),
        _ => Err(DatastetError::Other(format!(
            "Invalid mention type: {} (expected dataset-name or dataset)",
            type_str
        ))),
    }
}

/// Shorten `text` to at most `max` characters, marking the cut.
pub fn truncate(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let kept: String = flat.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}
