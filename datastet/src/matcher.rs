//! Multi-term matching over token sequences.
//!
//! Terms and token sequences go through the same preparation: tokenization,
//! optional removal of whitespace tokens, optional lower-casing. Token texts
//! are joined with a separator that cannot occur in text, so a match always
//! starts and ends on token boundaries once checked against the token map.

use crate::model::Token;
use crate::tokenizer::token_texts;
use crate::{DatastetError, Result};
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use std::collections::HashMap;

const TOKEN_SEPARATOR: char = '\u{1f}';

/// How terms are compared with the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Whitespace tokens are ignored on both sides
    pub ignore_delimiters: bool,
    pub case_sensitive: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            ignore_delimiters: true,
            case_sensitive: false,
        }
    }
}

/// A term occurrence, as inclusive token indices into the searched slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenMatch {
    pub start_token: usize,
    pub end_token: usize,
    /// Index of the matched term in the list given to [`LexicalMatcher::new`]
    pub term: usize,
}

/// Automaton over a fixed list of terms
#[derive(Debug, Clone)]
pub struct LexicalMatcher {
    automaton: Option<AhoCorasick>,
    /// Automaton pattern index to term index
    term_ids: Vec<usize>,
    terms: Vec<String>,
    options: MatchOptions,
}

impl LexicalMatcher {
    /// Build a matcher. Terms that prepare to nothing (blank terms) never match.
    pub fn new<I, S>(terms: I, options: MatchOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();

        let mut patterns = Vec::new();
        let mut term_ids = Vec::new();
        for (index, term) in terms.iter().enumerate() {
            let pieces = prepare(token_texts(term).iter().map(String::as_str), options);
            if pieces.is_empty() {
                continue;
            }
            patterns.push(pieces.join(&TOKEN_SEPARATOR.to_string()));
            term_ids.push(index);
        }

        let automaton = if patterns.is_empty() {
            None
        } else {
            Some(
                AhoCorasickBuilder::new()
                    .match_kind(MatchKind::Standard)
                    .build(&patterns)
                    .map_err(|e| DatastetError::Other(format!("Failed to build automaton: {}", e)))?,
            )
        };

        Ok(Self {
            automaton,
            term_ids,
            terms,
            options,
        })
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// All occurrences of any term in `tokens`, overlapping ones included.
    ///
    /// Results are sorted by start token, longer matches first; a span is
    /// reported once, for the lowest term index.
    pub fn find(&self, tokens: &[Token]) -> Vec<TokenMatch> {
        let Some(automaton) = &self.automaton else {
            return Vec::new();
        };

        let mut haystack = String::new();
        let mut starts: HashMap<usize, usize> = HashMap::new();
        let mut ends: HashMap<usize, usize> = HashMap::new();
        for (index, token) in tokens.iter().enumerate() {
            let pieces = prepare(std::iter::once(token.text.as_str()), self.options);
            let Some(piece) = pieces.into_iter().next() else {
                continue;
            };
            if !haystack.is_empty() {
                haystack.push(TOKEN_SEPARATOR);
            }
            starts.insert(haystack.len(), index);
            haystack.push_str(&piece);
            ends.insert(haystack.len(), index);
        }

        let mut best: HashMap<(usize, usize), usize> = HashMap::new();
        for found in automaton.find_overlapping_iter(&haystack) {
            let (Some(&start_token), Some(&end_token)) =
                (starts.get(&found.start()), ends.get(&found.end()))
            else {
                continue;
            };
            let term = self.term_ids[found.pattern().as_usize()];
            best.entry((start_token, end_token))
                .and_modify(|existing| *existing = (*existing).min(term))
                .or_insert(term);
        }

        let mut matches: Vec<TokenMatch> = best
            .into_iter()
            .map(|((start_token, end_token), term)| TokenMatch {
                start_token,
                end_token,
                term,
            })
            .collect();
        matches.sort_by(|a, b| {
            a.start_token
                .cmp(&b.start_token)
                .then_with(|| b.end_token.cmp(&a.end_token))
        });
        matches
    }

    /// Number of occurrences of each term in `tokens`.
    pub fn count(&self, tokens: &[Token]) -> Vec<usize> {
        let mut counts = vec![0; self.terms.len()];
        for found in self.find(tokens) {
            counts[found.term] += 1;
        }
        counts
    }
}

fn prepare<'a>(pieces: impl Iterator<Item = &'a str>, options: MatchOptions) -> Vec<String> {
    pieces
        .filter(|piece| !piece.is_empty())
        .filter(|piece| !(options.ignore_delimiters && piece.trim().is_empty()))
        .map(|piece| {
            if options.case_sensitive {
                piece.to_string()
            } else {
                piece.to_lowercase()
            }
        })
        .collect()
}
