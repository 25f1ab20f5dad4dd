//! The document processing pipeline.
//!
//! Stages run strictly in sequence, each one on the complete output of the
//! previous one:
//!
//! 1. tagging of all unlabelled sequences in one batch, extraction, grouping
//! 2. document-level context offsets
//! 3. data type classification
//! 4. term propagation
//! 5. URL re-attachment
//! 6. section relevance gate
//! 7. citation attachment, consolidation and propagation
//! 8. data availability marking
//! 9. role classification and aggregation
//! 10. disambiguation and filtering
//!
//! Remote stages are attempted once. A failing one is logged and skipped, and
//! the records keep what the earlier stages gave them.

mod builder;

pub use builder::DocumentProcessorBuilder;

use crate::attachment::{CitationAttacher, reattach_urls};
use crate::config::DatastetConfig;
use crate::context::ContextAggregator;
use crate::datatype::DatatypeStage;
use crate::disambiguation::DisambiguatorFilter;
use crate::extraction::{ComponentExtractor, parse_label_blocks, tagger_input};
use crate::grouping::group;
use crate::lexicon::Lexicon;
use crate::model::{BiblioComponent, Dataset, Document};
use crate::propagation::TermPropagator;
use crate::sections::{RelevanceGate, mark_availability};
use crate::services::{CitationConsolidator, Tagger};
use crate::{DatastetError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Result of processing one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    /// Dataset records in document order
    pub records: Vec<Dataset>,
    /// Citations attached to at least one record, one per reference key
    pub citations: Vec<BiblioComponent>,
    /// Wall-clock processing time in milliseconds
    pub runtime_ms: u64,
    /// Document text the record offsets refer to
    #[serde(default)]
    pub text: String,
}

/// Runs the pipeline over documents
///
/// A processor holds read-only state only and can be shared across tasks.
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    lexicon: Arc<Lexicon>,
    tagger: Arc<dyn Tagger>,
    extractor: ComponentExtractor,
    propagator: Option<TermPropagator>,
    gate: RelevanceGate,
    attacher: CitationAttacher,
    propagate_citations: bool,
    datatype: Option<DatatypeStage>,
    context: Option<ContextAggregator>,
    disambiguation: Option<DisambiguatorFilter>,
    consolidator: Option<Arc<dyn CitationConsolidator>>,
}

impl DocumentProcessor {
    pub fn builder() -> DocumentProcessorBuilder {
        DocumentProcessorBuilder::new()
    }

    /// Build a processor whose remote services follow the configuration.
    pub fn from_config(
        config: &DatastetConfig,
        lexicon: Arc<Lexicon>,
        tagger: Arc<dyn Tagger>,
    ) -> Result<Self> {
        DocumentProcessorBuilder::new()
            .with_config(config.clone())
            .with_lexicon(lexicon)
            .with_tagger(tagger)
            .build()
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Process one document.
    ///
    /// Fails only when the document is unusable or the tagger fails; remote
    /// enrichment stages degrade instead.
    pub async fn process(&self, document: Document) -> Result<ProcessedDocument> {
        let started = Instant::now();
        let document = document.prepare()?;
        let offsets = document.sequence_offsets();

        let labels = self.label(&document).await?;
        let mut records: Vec<Vec<Dataset>> = Vec::with_capacity(document.sequences.len());
        for ((sequence, labels), offset) in document.sequences.iter().zip(&labels).zip(&offsets) {
            let components = self
                .extractor
                .extract_with_urls(sequence, labels, &document.annotations);
            let mut local = self.extractor.filter_bad_names(group(&components, &sequence.text));
            for record in local.iter_mut() {
                record.set_global_context_offset(*offset);
            }
            records.push(local);
        }
        debug!(
            records = records.iter().map(Vec::len).sum::<usize>(),
            "Extracted dataset records"
        );

        if let Some(stage) = &self.datatype {
            if let Err(err) = stage.annotate(&document, &mut records).await {
                degrade("datatype", &err);
            }
        }

        if let Some(propagator) = &self.propagator {
            records = propagator.propagate(&document, records)?;
        }

        let mut flat: Vec<Dataset> = Vec::new();
        for (sequence, mut local) in document.sequences.iter().zip(records) {
            reattach_urls(&mut local, sequence, &document.annotations);
            let mut kept = self.gate.apply(local, sequence);
            kept.sort_by_key(|record| record.anchor().map(|a| a.offsets));
            flat.extend(kept);
        }

        self.attacher.attach(&mut flat, &document.citations);
        if let Some(consolidator) = &self.consolidator {
            if let Err(err) = self.attacher.consolidate(&mut flat, consolidator.as_ref()).await {
                degrade("consolidation", &err);
            }
        }
        if self.propagate_citations {
            self.attacher.propagate_citations(&mut flat);
        }

        mark_availability(&mut flat, &document.sequences);

        if let Some(aggregator) = &self.context {
            if let Err(err) = aggregator.classify(&mut flat).await {
                degrade("context", &err);
            }
        }

        if let Some(filter) = &self.disambiguation {
            if let Err(err) = filter.apply(&document, &mut flat).await {
                degrade("disambiguation", &err);
            }
        }

        let before = flat.len();
        flat.retain(|record| !record.filtered);
        if flat.len() < before {
            debug!(dropped = before - flat.len(), "Dropped filtered records");
        }

        let citations = unique_citations(&flat);
        let runtime_ms = elapsed_millis(started.elapsed());
        info!(
            records = flat.len(),
            citations = citations.len(),
            runtime_ms,
            "Processed document"
        );
        Ok(ProcessedDocument {
            records: flat,
            citations,
            runtime_ms,
            text: document.text(),
        })
    }

    /// Labels of every sequence, one per non-blank token.
    ///
    /// Sequences carrying labels keep them; the others go to the tagger in a
    /// single batch.
    async fn label(&self, document: &Document) -> Result<Vec<Vec<String>>> {
        let mut labels: Vec<Vec<String>> = document
            .sequences
            .iter()
            .map(|s| s.labels.clone().unwrap_or_default())
            .collect();

        let pending: Vec<usize> = document
            .sequences
            .iter()
            .enumerate()
            .filter(|(_, s)| s.labels.is_none() && s.content_tokens().next().is_some())
            .map(|(index, _)| index)
            .collect();
        if pending.is_empty() {
            return Ok(labels);
        }

        let input = tagger_input(pending.iter().map(|&index| &document.sequences[index]));
        let output = self.tagger.label(&input).await.map_err(|err| match err {
            DatastetError::Tagger(_) => err,
            other => DatastetError::Tagger(other.to_string()),
        })?;
        let blocks = parse_label_blocks(&output);
        if blocks.len() != pending.len() {
            warn!(
                expected = pending.len(),
                received = blocks.len(),
                tagger = self.tagger.name(),
                "Tagger answered a different number of sequences"
            );
        }

        for (index, block) in pending.into_iter().zip(blocks) {
            labels[index] = block;
        }
        Ok(labels)
    }
}

/// Milliseconds of `elapsed`, saturating.
fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Log a failed remote stage according to the error taxonomy.
fn degrade(stage: &str, err: &DatastetError) {
    match err {
        DatastetError::Service(_) => warn!(stage, "Stage skipped, service unavailable: {}", err),
        _ => error!(stage, "Stage skipped: {}", err),
    }
}

/// The attached citations, first occurrence of each reference key.
fn unique_citations(records: &[Dataset]) -> Vec<BiblioComponent> {
    let mut seen: Vec<&str> = Vec::new();
    let mut citations = Vec::new();
    for citation in records.iter().flat_map(|r| r.citations.iter()) {
        if !seen.contains(&citation.ref_key.as_str()) {
            seen.push(&citation.ref_key);
            citations.push(citation.clone());
        }
    }
    citations
}
