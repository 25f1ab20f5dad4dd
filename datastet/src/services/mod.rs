//! Boundaries to the external collaborators of the pipeline.
//!
//! Every remote stage sits behind an async trait so that the pipeline can be
//! driven by the HTTP clients in this module or by in-memory implementations
//! in tests. A trait call is attempted once per document; the caller decides
//! how a failure degrades.
//!
//! # Examples
//!
//! ```no_run
//! use async_trait::async_trait;
//! use datastet::services::Tagger;
//! use datastet::Result;
//!
//! #[derive(Debug)]
//! struct EverythingIsOther;
//!
//! #[async_trait]
//! impl Tagger for EverythingIsOther {
//!     fn name(&self) -> &str {
//!         "other"
//!     }
//!
//!     async fn label(&self, input: &str) -> Result<String> {
//!         Ok(input
//!             .lines()
//!             .map(|line| if line.is_empty() { String::new() } else { format!("{}\t<other>", line) })
//!             .collect::<Vec<_>>()
//!             .join("\n"))
//!     }
//! }
//! ```

pub mod biblio;
pub mod classifier;
pub mod entity_fishing;
pub mod tagger;

pub use biblio::BiblioLookupClient;
pub use classifier::ClassifierClient;
pub use entity_fishing::{DisambiguationQuery, EntityFishingClient, QueryEntity};
pub use tagger::FixedTagger;

use crate::model::BiblioItem;
use crate::{DatastetError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Sequence labelling model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Tagger: Send + Sync + std::fmt::Debug {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Label a batch of token blocks.
    ///
    /// The input holds one token per line, blocks separated by a blank line.
    /// The answer repeats the layout with the label in the last tab-separated
    /// column of each line.
    async fn label(&self, input: &str) -> Result<String>;
}

/// Model queried by the role classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextModel {
    /// Binary model for the `used` axis
    Used,
    /// Binary model for the `created` axis
    Creation,
    /// Binary model for the `shared` axis
    Shared,
    /// Multi-label model for all three axes
    All,
}

impl ContextModel {
    /// Model name on the classification service
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextModel::Used => "context_used",
            ContextModel::Creation => "context_creation",
            ContextModel::Shared => "context_shared",
            ContextModel::All => "context",
        }
    }
}

impl fmt::Display for ContextModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role classifier over mention contexts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContextClassifier: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Classify a batch of contexts.
    ///
    /// Returns `{"classifications": [{<class>: score, ..., "text": ...}]}` with
    /// one entry per input text, in input order.
    async fn classify(&self, texts: &[String], model: ContextModel) -> Result<Value>;
}

/// Sentence classifier deciding whether and which data is introduced
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatatypeClassifier: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Classify a batch of sentences, same answer layout as
    /// [`ContextClassifier::classify`] with `has_dataset`, `no_dataset` and one
    /// score per data type.
    async fn classify(&self, sentences: &[String]) -> Result<Value>;
}

/// Entity linking service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Disambiguator: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Whether the service answers at all.
    async fn is_alive(&self) -> Result<bool>;

    /// Link the entities of one query. The raw JSON answer is returned.
    async fn disambiguate(&self, query: &DisambiguationQuery) -> Result<Value>;
}

/// Bibliographic metadata lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CitationConsolidator: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Look up every item once. The answer has one slot per input item,
    /// `None` where nothing was found.
    async fn consolidate(&self, items: &[BiblioItem]) -> Result<Vec<Option<BiblioItem>>>;
}

/// Map a transport error to the service taxonomy: a body that does not decode
/// is malformed, everything else means the service could not be used.
pub(crate) fn map_http_error(service: &str, err: reqwest::Error) -> DatastetError {
    if err.is_decode() {
        DatastetError::MalformedResponse(format!("{} returned an unreadable body: {}", service, err))
    } else {
        DatastetError::Service(format!("{} request failed: {}", service, err))
    }
}

/// Build the HTTP client shared by the service clients.
pub(crate) fn http_client(service: &str, timeout: std::time::Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DatastetError::Service(format!("Failed to create HTTP client for {}: {}", service, e)))
}

/// Parse a response body as JSON.
pub(crate) fn parse_json(service: &str, body: &str) -> Result<Value> {
    serde_json::from_str(body)
        .map_err(|e| DatastetError::MalformedResponse(format!("{} returned invalid JSON: {}", service, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_model_names() {
        assert_eq!(ContextModel::Used.as_str(), "context_used");
        assert_eq!(ContextModel::Creation.to_string(), "context_creation");
        assert_eq!(ContextModel::All.as_str(), "context");
    }

    #[test]
    fn test_parse_json_maps_to_malformed() {
        assert!(parse_json("classifier", "{\"classifications\": []}").is_ok());
        assert!(matches!(
            parse_json("classifier", "<html>"),
            Err(DatastetError::MalformedResponse(_))
        ));
    }
}
