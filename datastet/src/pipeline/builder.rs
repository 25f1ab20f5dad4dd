//! Assembly of a [`DocumentProcessor`] from a configuration and services.

use super::DocumentProcessor;
use crate::attachment::CitationAttacher;
use crate::config::DatastetConfig;
use crate::context::ContextAggregator;
use crate::datatype::DatatypeStage;
use crate::disambiguation::DisambiguatorFilter;
use crate::extraction::ComponentExtractor;
use crate::lexicon::Lexicon;
use crate::propagation::TermPropagator;
use crate::sections::RelevanceGate;
use crate::services::{
    BiblioLookupClient, CitationConsolidator, ClassifierClient, ContextClassifier,
    DatatypeClassifier, Disambiguator, EntityFishingClient, Tagger,
};
use crate::{DatastetError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for a document processor
///
/// Services given explicitly are always used; the others are created from
/// the configuration when their section is enabled.
///
/// # Examples
///
/// ```rust
/// use datastet::prelude::*;
/// use std::sync::Arc;
///
/// fn example() -> Result<DocumentProcessor> {
///     DocumentProcessorBuilder::new()
///         .with_config(ConfigBuilder::testing().build()?)
///         .with_tagger(Arc::new(FixedTagger::new()))
///         .build()
/// }
/// ```
#[derive(Debug, Default)]
pub struct DocumentProcessorBuilder {
    config: DatastetConfig,
    lexicon: Option<Arc<Lexicon>>,
    tagger: Option<Arc<dyn Tagger>>,
    context_classifier: Option<Arc<dyn ContextClassifier>>,
    datatype_classifier: Option<Arc<dyn DatatypeClassifier>>,
    disambiguator: Option<Arc<dyn Disambiguator>>,
    consolidator: Option<Arc<dyn CitationConsolidator>>,
}

impl DocumentProcessorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: DatastetConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an already loaded lexicon; the built-in one is used otherwise.
    pub fn with_lexicon(mut self, lexicon: Arc<Lexicon>) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    pub fn with_tagger(mut self, tagger: Arc<dyn Tagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    pub fn with_context_classifier(mut self, classifier: Arc<dyn ContextClassifier>) -> Self {
        self.context_classifier = Some(classifier);
        self
    }

    pub fn with_datatype_classifier(mut self, classifier: Arc<dyn DatatypeClassifier>) -> Self {
        self.datatype_classifier = Some(classifier);
        self
    }

    pub fn with_disambiguator(mut self, disambiguator: Arc<dyn Disambiguator>) -> Self {
        self.disambiguator = Some(disambiguator);
        self
    }

    pub fn with_consolidator(mut self, consolidator: Arc<dyn CitationConsolidator>) -> Self {
        self.consolidator = Some(consolidator);
        self
    }

    /// Build the processor. A tagger is required.
    pub fn build(self) -> Result<DocumentProcessor> {
        let tagger = self
            .tagger
            .ok_or_else(|| DatastetError::Configuration("a tagger is required".to_string()))?;
        let lexicon = self.lexicon.unwrap_or_else(|| Arc::new(Lexicon::builtin()));
        let config = self.config;

        let context_classifier = self.context_classifier.or_else(|| {
            config.context.enabled.then(|| {
                Arc::new(
                    ClassifierClient::new(config.context.url.clone())
                        .with_timeout(Duration::from_secs(config.context.timeout_secs)),
                ) as Arc<dyn ContextClassifier>
            })
        });
        let datatype_classifier = self.datatype_classifier.or_else(|| {
            config.datatype.enabled.then(|| {
                Arc::new(
                    ClassifierClient::new(config.datatype.url.clone())
                        .with_timeout(Duration::from_secs(config.datatype.timeout_secs)),
                ) as Arc<dyn DatatypeClassifier>
            })
        });
        let disambiguator = self.disambiguator.or_else(|| {
            config.disambiguation.enabled.then(|| {
                Arc::new(
                    EntityFishingClient::new(config.disambiguation.url.clone())
                        .with_timeout(Duration::from_secs(config.disambiguation.timeout_secs)),
                ) as Arc<dyn Disambiguator>
            })
        });
        let consolidator = self.consolidator.or_else(|| {
            config.consolidation.enabled.then(|| {
                Arc::new(
                    BiblioLookupClient::new(config.consolidation.url.clone())
                        .with_timeout(Duration::from_secs(config.consolidation.timeout_secs)),
                ) as Arc<dyn CitationConsolidator>
            })
        });

        Ok(DocumentProcessor {
            tagger,
            extractor: ComponentExtractor::new(Arc::clone(&lexicon)),
            propagator: config
                .propagation
                .enabled
                .then(|| TermPropagator::new(Arc::clone(&lexicon), &config.propagation)),
            gate: RelevanceGate::new(Arc::clone(&lexicon), config.datatype.has_dataset_threshold),
            attacher: CitationAttacher::new(config.attachment.citation_window),
            propagate_citations: config.attachment.propagate_citations,
            datatype: datatype_classifier.map(DatatypeStage::new),
            context: context_classifier.map(|c| ContextAggregator::new(c, &config.context)),
            disambiguation: disambiguator.map(|d| DisambiguatorFilter::new(d, &config.disambiguation)),
            consolidator,
            lexicon,
        })
    }
}
