//! # Datastet
//!
//! Document-level extraction and consolidation of dataset mentions in
//! scholarly text.
//!
//! A document arrives as a list of token sequences together with the labels
//! of an upstream sequence tagger. The pipeline turns the labelled spans into
//! dataset records, finds further mentions of the recognised names across the
//! document, attaches URLs and bibliographic citations, aggregates role
//! classifications (used / created / shared) per dataset, and finally asks an
//! entity linking service whether a mention should be filtered out.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datastet::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ConfigBuilder::testing().build()?;
//!     let processor = datastet::init(&config, Arc::new(FixedTagger::new()))?;
//!
//!     let sequence = DocumentSequence::new("The GSE12345 dataset is available at https://osf.io/abc123.");
//!     let processed = processor.process(Document::new(vec![sequence])).await?;
//!     for record in &processed.records {
//!         println!("{}", record.raw_form);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Local stages**: component extraction, grouping, term propagation,
//!   URL and citation attachment, section gating. Always available.
//! - **Remote stages**: data-type and role classification, entity linking,
//!   bibliographic consolidation. Each is optional and degrades gracefully:
//!   a failing service leaves the records without the corresponding
//!   enrichment.

pub mod attachment;
pub mod config;
pub mod context;
pub mod datatype;
pub mod disambiguation;
pub mod extraction;
pub mod grouping;
pub mod lexicon;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod propagation;
pub mod sections;
pub mod services;
pub mod tokenizer;

use std::sync::Arc;

/// The prelude re-exports commonly used types for convenience
pub mod prelude {
    pub use crate::init;

    pub use crate::config::{ClassifierMode, ConfigBuilder, ConfigLoader, DatastetConfig, LogLevel};

    pub use crate::lexicon::Lexicon;

    pub use crate::model::{
        BiblioComponent, BiblioItem, Component, ComponentType, ContextAttributes, Dataset,
        Document, DocumentSequence, OffsetSpan, Token,
    };

    pub use crate::pipeline::{DocumentProcessor, DocumentProcessorBuilder, ProcessedDocument};

    pub use crate::services::{
        CitationConsolidator, ContextClassifier, DatatypeClassifier, Disambiguator, FixedTagger,
        Tagger,
    };

    pub use crate::{DatastetError, Result};
}

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error type for Datastet operations
#[derive(Debug, thiserror::Error)]
pub enum DatastetError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Lexicon resources could not be loaded
    #[error("Lexicon error: {0}")]
    Lexicon(String),

    /// The sequence tagger failed or returned an unusable stream
    #[error("Tagger error: {0}")]
    Tagger(String),

    /// An external service could not be reached
    #[error("Service error: {0}")]
    Service(String),

    /// An external service answered with something that does not parse
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The input document is unusable; no partial output is produced
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Logging error
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LogError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other unclassified errors
    #[error("{0}")]
    Other(String),
}

impl From<crate::config::ConfigError> for DatastetError {
    fn from(err: crate::config::ConfigError) -> Self {
        DatastetError::Configuration(err.to_string())
    }
}

/// Result type for Datastet operations
pub type Result<T> = std::result::Result<T, DatastetError>;

/// Build a document processor from a configuration.
///
/// The lexicon is loaded once and the remote services enabled in the
/// configuration get HTTP clients. Logging is left to the caller, see
/// [`logging::init`].
///
/// # Examples
///
/// ```rust,no_run
/// use datastet::prelude::*;
/// use std::sync::Arc;
///
/// fn example() -> Result<()> {
///     let config = ConfigBuilder::new()
///         .with_disambiguation_service("http://localhost:8090")
///         .build()?;
///     let processor = datastet::init(&config, Arc::new(FixedTagger::new()))?;
///     Ok(())
/// }
/// ```
pub fn init(
    config: &config::DatastetConfig,
    tagger: Arc<dyn services::Tagger>,
) -> Result<pipeline::DocumentProcessor> {
    let lexicon = Arc::new(lexicon::Lexicon::from_config(&config.lexicon)?);
    pipeline::DocumentProcessor::from_config(config, lexicon, tagger)
}
