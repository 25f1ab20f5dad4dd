//! Offset arithmetic shared by every pipeline stage.
//!
//! Components are anchored relative to the segment (sentence or paragraph)
//! they were extracted from. Once the segment's position inside the document
//! is known, a shift is recorded on the span and all document-level
//! comparisons go through [`OffsetSpan::global_start`] and
//! [`OffsetSpan::global_end`]. Offsets are UTF-8 byte positions.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A half-open `[start, end)` span, local to a segment, with an optional
/// document-level shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OffsetSpan {
    /// Start offset relative to the owning segment
    pub start: usize,
    /// End offset (exclusive) relative to the owning segment
    pub end: usize,
    /// Offset of the owning segment inside the document, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<usize>,
}

impl OffsetSpan {
    /// Create a local span. A reversed range collapses to an empty span at `start`.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
            shift: None,
        }
    }

    /// Create a span whose offsets are already document-level.
    pub fn document(start: usize, end: usize) -> Self {
        Self::new(start, end).with_shift(0)
    }

    /// Record the document-level shift of the owning segment.
    pub fn with_shift(mut self, shift: usize) -> Self {
        self.shift = Some(shift);
        self
    }

    /// Drop the shift, keeping the segment-relative offsets.
    pub fn local(&self) -> Self {
        Self::new(self.start, self.end)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Start offset in the document frame (the local start when no shift is known).
    pub fn global_start(&self) -> usize {
        self.start + self.shift.unwrap_or(0)
    }

    /// End offset in the document frame.
    pub fn global_end(&self) -> usize {
        self.end + self.shift.unwrap_or(0)
    }

    /// The same span expressed with document-level offsets and a zero shift.
    pub fn to_document(&self) -> Self {
        Self::document(self.global_start(), self.global_end())
    }

    /// Clamp the span into `[0, len]`, snapping inside `text` to char boundaries.
    pub fn clamp_to(&self, text: &str) -> Self {
        let end = floor_char_boundary(text, self.end.min(text.len()));
        let start = floor_char_boundary(text, self.start.min(end));
        Self {
            start,
            end,
            shift: self.shift,
        }
    }

    /// The slice of `text` covered by this span, clamped.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        let clamped = self.clamp_to(text);
        &text[clamped.start..clamped.end]
    }

    /// Whether two spans touch the same material, compared in the document frame.
    ///
    /// Spans sharing a start or an end always overlap, otherwise one start must
    /// fall inside the other span.
    pub fn overlaps(&self, other: &OffsetSpan) -> bool {
        let (a_start, a_end) = (self.global_start(), self.global_end());
        let (b_start, b_end) = (other.global_start(), other.global_end());
        a_start == b_start
            || a_end == b_end
            || (a_start <= b_start && b_start < a_end)
            || (b_start <= a_start && a_start < b_end)
    }

    /// Whether a document-level offset falls inside this span.
    pub fn contains_global(&self, offset: usize) -> bool {
        self.global_start() <= offset && offset < self.global_end()
    }
}

impl PartialOrd for OffsetSpan {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OffsetSpan {
    fn cmp(&self, other: &Self) -> Ordering {
        self.global_start()
            .cmp(&other.global_start())
            .then_with(|| self.global_end().cmp(&other.global_end()))
    }
}

/// Whether any span of `list` overlaps `span`.
pub fn overlaps_any(list: &[OffsetSpan], span: &OffsetSpan) -> bool {
    list.iter().any(|existing| existing.overlaps(span))
}

/// Largest char boundary of `text` not greater than `index`.
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Convert a byte offset of `text` into a character offset.
pub fn byte_to_char(text: &str, byte: usize) -> usize {
    let byte = floor_char_boundary(text, byte);
    text[..byte].chars().count()
}
