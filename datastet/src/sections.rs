//! Section-level decisions: which records a section may keep, and which
//! records sit in a data availability statement.

use crate::lexicon::Lexicon;
use crate::model::{ComponentType, Dataset, DocumentSequence, Token};
use std::sync::Arc;
use tracing::debug;

/// Whether a section heading announces a data availability statement:
/// it mentions data or code, and availability or sharing.
pub fn is_availability_heading(heading: &str) -> bool {
    let heading = heading.to_lowercase();
    (heading.contains("data") || heading.contains("code"))
        && (heading.contains("availab") || heading.contains("sharing"))
}

/// Same decision for an annex without heading, from its first ten tokens.
pub fn is_availability_annex(tokens: &[Token]) -> bool {
    let mut data_found = false;
    let mut availability_found = false;
    for token in tokens.iter().take(10) {
        let text = token.text.to_lowercase();
        data_found |= text.starts_with("data") || text.starts_with("code");
        availability_found |= text.contains("availab") || text.contains("sharing");
        if data_found && availability_found {
            return true;
        }
    }
    false
}

/// Drops records their section does not allow
#[derive(Debug, Clone)]
pub struct RelevanceGate {
    lexicon: Arc<Lexicon>,
    has_dataset_threshold: f64,
}

impl RelevanceGate {
    pub fn new(lexicon: Arc<Lexicon>, has_dataset_threshold: f64) -> Self {
        Self {
            lexicon,
            has_dataset_threshold,
        }
    }

    /// A record whose URL points to a dataset DOI or a data repository.
    pub fn is_reference_data_source(&self, record: &Dataset) -> bool {
        record
            .url
            .as_ref()
            .is_some_and(|url| self.lexicon.is_dataset_url_or_doi(&url.normalized_form))
    }

    /// Whether `record`, found in `sequence`, survives the gate.
    pub fn keeps(&self, record: &Dataset, sequence: &DocumentSequence) -> bool {
        let reference = self.is_reference_data_source(record);
        match record.dataset_type {
            ComponentType::DatasetName => sequence.relevant_named_datasets,
            ComponentType::Dataset => {
                if reference {
                    return true;
                }
                if !sequence.relevant_implicit_datasets {
                    return false;
                }
                let score = record.dataset.as_ref().and_then(|d| d.has_dataset_score);
                !matches!(score, Some(score) if score < self.has_dataset_threshold)
            }
            _ => true,
        }
    }

    /// Filter the records of one sequence.
    pub fn apply(&self, records: Vec<Dataset>, sequence: &DocumentSequence) -> Vec<Dataset> {
        let before = records.len();
        let kept: Vec<Dataset> = records
            .into_iter()
            .filter(|record| self.keeps(record, sequence))
            .collect();
        if kept.len() < before {
            debug!(
                sequence = sequence.id.as_deref().unwrap_or("-"),
                dropped = before - kept.len(),
                "Section gate dropped records"
            );
        }
        kept
    }
}

/// Flag records whose context contains a token of an availability sequence.
///
/// The context span is `[global context offset, offset + context length)`.
/// Returns the number of records newly flagged.
pub fn mark_availability(records: &mut [Dataset], sequences: &[DocumentSequence]) -> usize {
    let offsets: Vec<usize> = sequences
        .iter()
        .filter(|sequence| sequence.in_availability_section)
        .flat_map(|sequence| sequence.tokens.iter().map(|token| token.offset))
        .collect();
    if offsets.is_empty() {
        return 0;
    }

    let mut marked = 0;
    for record in records.iter_mut().filter(|r| !r.in_data_availability_section) {
        let Some(span) = record.context_span() else {
            continue;
        };
        if offsets.iter().any(|offset| span.contains_global(*offset)) {
            record.in_data_availability_section = true;
            marked += 1;
        }
    }
    marked
}
