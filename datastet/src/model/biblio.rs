//! Bibliographic reference markers and the records they point to.

use super::OffsetSpan;
use serde::{Deserialize, Serialize};

/// Bibliographic metadata of a reference list entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiblioItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    /// Raw reference string, used for lookup
    #[serde(default)]
    pub raw: Option<String>,
}

impl BiblioItem {
    /// Fill fields missing here with values found in `consolidated`.
    pub fn correct(&mut self, consolidated: &BiblioItem) {
        if self.title.is_none() {
            self.title = consolidated.title.clone();
        }
        if self.authors.is_empty() {
            self.authors = consolidated.authors.clone();
        }
        if self.doi.is_none() {
            self.doi = consolidated.doi.clone();
        }
        if self.year.is_none() {
            self.year = consolidated.year.clone();
        }
    }
}

/// A citation marker in the text ("[12]", "Smith et al. 2020")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiblioComponent {
    /// Key of the reference list entry the marker points to
    pub ref_key: String,
    /// Marker text
    pub raw_form: String,
    /// Document-level offsets of the marker
    pub offsets: OffsetSpan,
    /// Metadata of the referenced entry
    #[serde(default)]
    pub item: Option<BiblioItem>,
}

impl BiblioComponent {
    /// Create a marker at document-level offsets.
    pub fn new(ref_key: impl Into<String>, raw_form: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            ref_key: ref_key.into(),
            raw_form: raw_form.into(),
            offsets: OffsetSpan::document(start, end),
            item: None,
        }
    }

    pub fn with_item(mut self, item: BiblioItem) -> Self {
        self.item = Some(item);
        self
    }
}
