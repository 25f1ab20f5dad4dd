//! Component extraction: labelled token streams to typed spans.

pub mod labels;
pub mod urls;

pub use labels::{LabelCluster, cluster, parse_label_blocks, tagger_input};
pub use urls::{detect_urls, url_spans};

use crate::lexicon::Lexicon;
use crate::model::{Component, Dataset, DocumentSequence, PdfAnnotation, overlaps_any};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

lazy_static! {
    static ref JUNK_PATTERN: Regex = Regex::new(r"^[0-9()/\[\],.:\-+; ]+$").unwrap();
}

/// Whether a normalized form is made of digits and punctuation only.
pub fn is_junk(normalized: &str) -> bool {
    JUNK_PATTERN.is_match(normalized)
}

/// Turns tagger labels into components and filters out unusable ones
#[derive(Debug, Clone)]
pub struct ComponentExtractor {
    lexicon: Arc<Lexicon>,
}

impl ComponentExtractor {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// Components of the labelled spans of a sequence.
    ///
    /// Leading and trailing blank tokens and trailing superscript numbers
    /// (footnote markers) are trimmed from each span. Spans whose normalized
    /// form is empty, junk or a stopword are dropped.
    pub fn extract(&self, sequence: &DocumentSequence, labels: &[String]) -> Vec<Component> {
        let mut components = Vec::new();

        for found in cluster(sequence, labels) {
            let Some(component_type) = found.component_type else {
                continue;
            };
            let Some((first, last)) = self.trim_cluster(sequence, &found) else {
                continue;
            };

            let span = sequence.token_span(first, last);
            let component = Component::new(component_type, span.slice(&sequence.text), span)
                .with_tokens(sequence.tokens[first..=last].to_vec())
                .with_label(found.label.clone())
                .with_sequence_id(sequence.id.clone());

            let normalized = component.normalized_form.as_str();
            if normalized.is_empty()
                || is_junk(normalized)
                || self.lexicon.is_english_stopword(normalized)
            {
                debug!(raw = %component.raw_form, "Dropping junk component");
                continue;
            }
            components.push(component);
        }

        components
    }

    /// Tagger components plus the URLs that do not overlap them, sorted by offset.
    pub fn extract_with_urls(
        &self,
        sequence: &DocumentSequence,
        labels: &[String],
        annotations: &[PdfAnnotation],
    ) -> Vec<Component> {
        let mut components = self.extract(sequence, labels);
        let taken: Vec<_> = components.iter().map(|c| c.offsets).collect();

        components.extend(
            detect_urls(sequence, annotations)
                .into_iter()
                .filter(|url| !overlaps_any(&taken, &url.offsets)),
        );
        components.sort_by(|a, b| a.offsets.cmp(&b.offsets));
        components
    }

    /// Drop named records whose name is empty, a stopword or blacklisted.
    pub fn filter_bad_names(&self, records: Vec<Dataset>) -> Vec<Dataset> {
        records
            .into_iter()
            .filter(|record| match &record.dataset_name {
                Some(name) => {
                    let term = name.normalized_form.as_str();
                    let keep = !term.is_empty()
                        && !self.lexicon.is_english_stopword(term)
                        && !self.lexicon.is_blacklisted_named_dataset(term);
                    if !keep {
                        debug!(name = %term, "Dropping dataset name");
                    }
                    keep
                }
                None => true,
            })
            .collect()
    }

    fn trim_cluster(&self, sequence: &DocumentSequence, found: &LabelCluster) -> Option<(usize, usize)> {
        let tokens = &sequence.tokens;
        let mut first = found.first_token;
        let mut last = found.last_token.min(tokens.len().checked_sub(1)?);

        while first <= last && tokens[first].is_blank() {
            first += 1;
        }
        while first <= last {
            let token = &tokens[last];
            let footnote = token.superscript
                && !token.text.is_empty()
                && token.text.chars().all(|c| c.is_ascii_digit());
            if token.is_blank() || footnote {
                if last == 0 {
                    return None;
                }
                last -= 1;
            } else {
                break;
            }
        }

        (first <= last).then_some((first, last))
    }
}
