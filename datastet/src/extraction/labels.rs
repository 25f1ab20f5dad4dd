//! Tagger label streams.
//!
//! The tagger reads one non-blank token per line, sequences separated by a
//! blank line, and answers with the same layout where the last tab-separated
//! column of each line is the label.

use crate::model::{ComponentType, DocumentSequence};
use tracing::warn;

/// Label of tokens outside any span
pub const OTHER_LABEL: &str = "<other>";

/// Prefix marking the first token of a span
pub const BEGIN_PREFIX: &str = "I-";

/// Build the tagger input for a batch of sequences.
///
/// Sequences without non-blank tokens contribute no block.
pub fn tagger_input<'a>(sequences: impl IntoIterator<Item = &'a DocumentSequence>) -> String {
    let blocks: Vec<String> = sequences
        .into_iter()
        .filter_map(|sequence| {
            let lines: Vec<&str> = sequence.content_tokens().map(|t| t.text.as_str()).collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        })
        .collect();
    blocks.join("\n\n")
}

/// Split a tagger answer into label blocks, one label per line.
pub fn parse_label_blocks(output: &str) -> Vec<Vec<String>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in output.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        let label = line.rsplit('\t').next().unwrap_or(OTHER_LABEL).trim();
        current.push(label.to_string());
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Consecutive tokens sharing one label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCluster {
    /// Span type, `None` for `<other>`
    pub component_type: Option<ComponentType>,
    /// Label without the begin prefix
    pub label: String,
    /// Index of the first token in the sequence
    pub first_token: usize,
    /// Index of the last token in the sequence, inclusive
    pub last_token: usize,
}

/// Cluster the tokens of a sequence by label.
///
/// `labels` has one entry per non-blank token. Blank tokens join the current
/// cluster. A new cluster starts on a label change or on a begin prefix.
/// Missing labels count as `<other>`; extra labels are ignored.
pub fn cluster(sequence: &DocumentSequence, labels: &[String]) -> Vec<LabelCluster> {
    let content = sequence.content_tokens().count();
    if labels.len() != content {
        warn!(
            sequence = sequence.id.as_deref().unwrap_or("-"),
            tokens = content,
            labels = labels.len(),
            "Label stream misaligned with tokens"
        );
    }

    let mut clusters: Vec<LabelCluster> = Vec::new();
    let mut next_label = labels.iter();
    for (index, token) in sequence.tokens.iter().enumerate() {
        if token.is_blank() {
            if let Some(current) = clusters.last_mut() {
                current.last_token = index;
            }
            continue;
        }

        let raw = next_label.next().map(String::as_str).unwrap_or(OTHER_LABEL);
        let begins = raw.starts_with(BEGIN_PREFIX);
        let label = raw.trim_start_matches(BEGIN_PREFIX);

        match clusters.last_mut() {
            Some(current) if !begins && current.label == label => current.last_token = index,
            _ => clusters.push(LabelCluster {
                component_type: ComponentType::from_label(label),
                label: label.to_string(),
                first_token: index,
                last_token: index,
            }),
        }
    }
    clusters
}
