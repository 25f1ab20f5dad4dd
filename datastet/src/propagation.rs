//! Term propagation: a document-level recall pass.
//!
//! The tagger fires on strong local cues only. Every dataset name it found is
//! searched again in all sequences of the document; a new occurrence becomes a
//! propagated mention when its tf-idf passes the gate.

use crate::config::PropagationConfig;
use crate::lexicon::Lexicon;
use crate::matcher::{LexicalMatcher, MatchOptions};
use crate::model::{
    Component, ComponentType, Dataset, Document, DocumentSequence, OffsetSpan, overlaps_any,
};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    ignore_delimiters: true,
    case_sensitive: true,
};

/// Matcher and statistics for the names recognised in one document
#[derive(Debug, Clone)]
pub struct TermIndex {
    matcher: LexicalMatcher,
    /// Idf of each searched form
    profiles: HashMap<String, f64>,
    /// Occurrences of each recognised raw form in the whole document
    frequencies: HashMap<String, usize>,
}

impl TermIndex {
    /// Score of a matched surface form.
    ///
    /// The term frequency defaults to 1 for forms other than a recognised raw
    /// form; a form without a profile scores -1.
    pub fn tfidf(&self, matched: &str) -> f64 {
        let frequency = self.frequencies.get(matched).copied().unwrap_or(1);
        match self.profiles.get(matched) {
            Some(idf) => frequency as f64 * idf,
            None => -1.0,
        }
    }

    pub fn frequency(&self, term: &str) -> Option<usize> {
        self.frequencies.get(term).copied()
    }

    pub fn terms(&self) -> &[String] {
        self.matcher.terms()
    }
}

/// Finds further mentions of recognised dataset names
#[derive(Debug, Clone)]
pub struct TermPropagator {
    lexicon: Arc<Lexicon>,
    threshold: f64,
    confidence: f64,
}

impl TermPropagator {
    pub fn new(lexicon: Arc<Lexicon>, config: &PropagationConfig) -> Self {
        Self {
            lexicon,
            threshold: config.tfidf_threshold,
            confidence: config.confidence,
        }
    }

    /// The tf-idf gate: unknown terms pass, known ones must beat the threshold.
    pub fn accepts(&self, tfidf: f64) -> bool {
        tfidf <= 0.0 || tfidf > self.threshold
    }

    /// Build the term index over the named records, `None` when there are none.
    pub fn index(&self, records: &[Vec<Dataset>], document: &Document) -> Result<Option<TermIndex>> {
        let names: Vec<&Component> = records
            .iter()
            .flatten()
            .filter_map(|record| record.dataset_name.as_ref())
            .collect();
        if names.is_empty() {
            return Ok(None);
        }

        let mut terms: Vec<String> = Vec::new();
        let mut profiles: HashMap<String, f64> = HashMap::new();
        for name in &names {
            let variants = self.variants(name);
            let searchable = variants.first().is_some_and(|term| self.searchable(term));
            for variant in variants {
                profiles
                    .entry(variant.clone())
                    .or_insert_with(|| self.lexicon.term_idf(&variant));
                if searchable && !terms.contains(&variant) {
                    terms.push(variant);
                }
            }
        }

        let mut raw_forms: Vec<String> = Vec::new();
        for name in &names {
            if !raw_forms.contains(&name.raw_form) {
                raw_forms.push(name.raw_form.clone());
            }
        }
        let counter = LexicalMatcher::new(raw_forms.iter().cloned(), MATCH_OPTIONS)?;
        let all_tokens: Vec<_> = document.tokens().cloned().collect();
        let frequencies = raw_forms
            .into_iter()
            .zip(counter.count(&all_tokens))
            .collect();

        debug!(terms = terms.len(), "Prepared propagation terms");
        Ok(Some(TermIndex {
            matcher: LexicalMatcher::new(terms, MATCH_OPTIONS)?,
            profiles,
            frequencies,
        }))
    }

    /// Run the recall pass over all sequences.
    ///
    /// `records` holds the records of each sequence, in sequence order, with
    /// global context offsets already set.
    pub fn propagate(&self, document: &Document, mut records: Vec<Vec<Dataset>>) -> Result<Vec<Vec<Dataset>>> {
        let Some(index) = self.index(&records, document)? else {
            return Ok(records);
        };

        let offsets = document.sequence_offsets();
        for ((sequence, base), local) in document.sequences.iter().zip(offsets).zip(records.iter_mut()) {
            let added = self.propagate_sequence(&index, sequence, base, local);
            if added > 0 {
                debug!(
                    sequence = sequence.id.as_deref().unwrap_or("-"),
                    count = added,
                    "Propagated dataset names"
                );
            }
            local.sort_by_key(|record| record.anchor().map(|a| a.offsets));
        }
        Ok(records)
    }

    /// Add propagated mentions to the records of one sequence. Returns the
    /// number of mentions added.
    pub fn propagate_sequence(
        &self,
        index: &TermIndex,
        sequence: &DocumentSequence,
        sequence_offset: usize,
        records: &mut Vec<Dataset>,
    ) -> usize {
        let mut taken: Vec<OffsetSpan> = records
            .iter()
            .flat_map(|record| record.components())
            .filter(|component| component.component_type != ComponentType::Url)
            .map(|component| component.offsets.local().with_shift(sequence_offset))
            .collect();

        let mut added = 0;
        for found in index.matcher.find(&sequence.tokens) {
            let span = sequence.token_span(found.start_token, found.end_token);
            let global = span.with_shift(sequence_offset);
            if overlaps_any(&taken, &global) {
                continue;
            }

            let matched = span.slice(&sequence.text);
            let tfidf = index.tfidf(matched);
            if !self.accepts(tfidf) {
                debug!(term = %matched, tfidf, "Propagation rejected by tf-idf gate");
                continue;
            }

            let name = Component::new(ComponentType::DatasetName, matched, span)
                .with_tokens(sequence.tokens[found.start_token..=found.end_token].to_vec())
                .with_sequence_id(sequence.id.clone());
            let Some(mut record) = Dataset::from_anchor(name) else {
                continue;
            };
            record.context = Some(sequence.text.clone());
            record.propagated = true;
            record.conf = self.confidence;
            record.set_global_context_offset(sequence_offset);

            taken.push(global);
            records.push(record);
            added += 1;
        }
        added
    }

    /// Searched forms of a recognised name, the raw form first.
    fn variants(&self, name: &Component) -> Vec<String> {
        let term = normalize_spaces(&name.raw_form);
        if term.trim().is_empty() {
            return Vec::new();
        }

        let mut variants = vec![term.clone()];
        let mut push = |variant: String| {
            if !variant.trim().is_empty() && !variants.contains(&variant) {
                variants.push(variant);
            }
        };

        if !is_all_upper_case(&term) {
            push(term.to_lowercase());
        }
        push(term.replace(['(', ')', ',', ';'], ""));
        if term.ends_with("dataset") || term.ends_with("Dataset") {
            push(format!("{}s", term));
        } else if let Some(singular) = term
            .strip_suffix("datasets")
            .map(|t| format!("{}dataset", t))
            .or_else(|| term.strip_suffix("Datasets").map(|t| format!("{}Dataset", t)))
        {
            push(singular);
        }
        push(name.normalized_form.clone());
        variants
    }

    /// Capitalised stopwords ("The", "Data") are never searched.
    fn searchable(&self, term: &str) -> bool {
        let capitalised = term.chars().next().is_some_and(char::is_uppercase);
        !(capitalised
            && !is_all_upper_case(term)
            && self.lexicon.is_english_stopword(&term.to_lowercase()))
    }
}

fn normalize_spaces(raw: &str) -> String {
    let replaced = raw.replace('\n', " ");
    let mut result = String::with_capacity(replaced.len());
    let mut previous_space = false;
    for c in replaced.chars() {
        if c == ' ' {
            if !previous_space {
                result.push(c);
            }
            previous_space = true;
        } else {
            result.push(c);
            previous_space = false;
        }
    }
    result
}

fn is_all_upper_case(term: &str) -> bool {
    term.chars().any(char::is_alphabetic) && !term.chars().any(char::is_lowercase)
}
