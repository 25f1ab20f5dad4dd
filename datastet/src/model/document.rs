//! Input document model: sequences of layout tokens plus document-level
//! citation markers and hyperlink annotations.

use super::{BiblioComponent, OffsetSpan};
use crate::tokenizer::{tokenize, tokens_to_text};
use crate::{DatastetError, Result};
use serde::{Deserialize, Serialize};

/// Rectangle on a rendered page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Page number, starting at 1
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Whether two boxes on the same page intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.page == other.page
            && self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Smallest box enclosing both, when they sit on the same page.
    pub fn union(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if self.page != other.page {
            return None;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Some(BoundingBox {
            page: self.page,
            x,
            y,
            width: right - x,
            height: bottom - y,
        })
    }
}

/// Merge the boxes of consecutive tokens into one box per page run.
pub fn bounding_boxes(tokens: &[Token]) -> Vec<BoundingBox> {
    let mut boxes: Vec<BoundingBox> = Vec::new();
    for token_box in tokens.iter().filter_map(|t| t.bounding_box) {
        match boxes.last_mut() {
            Some(last) => match last.union(&token_box) {
                Some(merged) => *last = merged,
                None => boxes.push(token_box),
            },
            None => boxes.push(token_box),
        }
    }
    boxes
}

/// A layout token as produced by the upstream parsing stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Token text
    pub text: String,
    /// Document-level offset of the first character
    #[serde(default)]
    pub offset: usize,
    /// Whether the token is typeset as superscript (footnote markers)
    #[serde(default)]
    pub superscript: bool,
    /// Position on the page, when the source was a PDF
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl Token {
    pub fn new(text: impl Into<String>, offset: usize) -> Self {
        Self {
            text: text.into(),
            offset,
            superscript: false,
            bounding_box: None,
        }
    }

    pub fn with_superscript(mut self, superscript: bool) -> Self {
        self.superscript = superscript;
        self
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    /// Whitespace-only or empty token
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Kind of PDF annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// External hyperlink
    Uri,
    /// Internal link
    Goto,
    /// Link to another document
    Gotor,
}

/// A PDF link annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfAnnotation {
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    /// Link destination
    pub destination: String,
    /// Active areas of the link
    #[serde(default)]
    pub boxes: Vec<BoundingBox>,
}

impl PdfAnnotation {
    /// Whether the annotation's active area covers the token.
    pub fn covers(&self, token: &Token) -> bool {
        match token.bounding_box {
            Some(token_box) => self.boxes.iter().any(|b| b.intersects(&token_box)),
            None => false,
        }
    }
}

/// A hyperlink carried by the input markup, sequence-relative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlReference {
    pub start: usize,
    pub end: usize,
    /// Link target, when the markup gives one
    #[serde(default)]
    pub target: Option<String>,
}

/// One sentence or paragraph of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSequence {
    /// Identifier of the sequence in the source markup
    #[serde(default)]
    pub id: Option<String>,
    /// Plain text of the sequence
    pub text: String,
    /// Layout tokens; rebuilt from `text` when absent
    #[serde(default)]
    pub tokens: Vec<Token>,
    /// Whether named datasets are kept for this sequence's section
    #[serde(default = "default_true")]
    pub relevant_named_datasets: bool,
    /// Whether implicit datasets are kept for this sequence's section
    #[serde(default = "default_true")]
    pub relevant_implicit_datasets: bool,
    /// Whether the sequence belongs to a data availability statement
    #[serde(default)]
    pub in_availability_section: bool,
    /// Hyperlinks carried by the input markup
    #[serde(default)]
    pub url_references: Vec<UrlReference>,
    /// Pre-computed tagger labels, one per non-blank token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

impl DocumentSequence {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            tokens: Vec::new(),
            relevant_named_datasets: true,
            relevant_implicit_datasets: true,
            in_availability_section: false,
            url_references: Vec::new(),
            labels: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_relevance(mut self, named: bool, implicit: bool) -> Self {
        self.relevant_named_datasets = named;
        self.relevant_implicit_datasets = implicit;
        self
    }

    pub fn with_availability_section(mut self, flag: bool) -> Self {
        self.in_availability_section = flag;
        self
    }

    pub fn with_url_reference(mut self, reference: UrlReference) -> Self {
        self.url_references.push(reference);
        self
    }

    /// Non-blank tokens, the ones sent to the tagger.
    pub fn content_tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| !t.is_blank())
    }

    /// Local offset of each token, computed from the token texts.
    pub fn local_token_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.tokens.len());
        let mut cursor = 0;
        for token in &self.tokens {
            offsets.push(cursor);
            cursor += token.text.len();
        }
        offsets
    }

    /// Local span covered by tokens `first..=last`.
    pub fn token_span(&self, first: usize, last: usize) -> OffsetSpan {
        let offsets = self.local_token_offsets();
        let start = offsets.get(first).copied().unwrap_or(self.text.len());
        let end = match (offsets.get(last), self.tokens.get(last)) {
            (Some(offset), Some(token)) => offset + token.text.len(),
            _ => self.text.len(),
        };
        OffsetSpan::new(start, end).clamp_to(&self.text)
    }
}

/// A document ready for dataset mention processing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Sequences in reading order
    pub sequences: Vec<DocumentSequence>,
    /// Bibliographic reference markers, document-level offsets
    #[serde(default)]
    pub citations: Vec<BiblioComponent>,
    /// PDF link annotations
    #[serde(default)]
    pub annotations: Vec<PdfAnnotation>,
}

impl Document {
    pub fn new(sequences: Vec<DocumentSequence>) -> Self {
        Self {
            sequences,
            citations: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_citation(mut self, citation: BiblioComponent) -> Self {
        self.citations.push(citation);
        self
    }

    pub fn with_annotation(mut self, annotation: PdfAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Document-level offset of each sequence: the running sum of the
    /// preceding sequence text lengths.
    pub fn sequence_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.sequences.len());
        let mut cursor = 0;
        for sequence in &self.sequences {
            offsets.push(cursor);
            cursor += sequence.text.len();
        }
        offsets
    }

    /// Full document text.
    pub fn text(&self) -> String {
        self.sequences.iter().map(|s| s.text.as_str()).collect()
    }

    /// All tokens of the document in reading order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.sequences.iter().flat_map(|s| s.tokens.iter())
    }

    /// Validate the document and rebuild missing tokens.
    ///
    /// Sequences without tokens are tokenized from their text. Supplied tokens
    /// must concatenate to the sequence text; their offsets are rewritten to
    /// document-level positions.
    pub fn prepare(mut self) -> Result<Self> {
        if self.sequences.is_empty() {
            return Err(DatastetError::InvalidDocument(
                "document has no sequences".to_string(),
            ));
        }

        let offsets = self.sequence_offsets();
        for (index, (sequence, base)) in self.sequences.iter_mut().zip(offsets).enumerate() {
            if sequence.tokens.is_empty() {
                sequence.tokens = tokenize(&sequence.text, base);
                continue;
            }

            if tokens_to_text(&sequence.tokens) != sequence.text {
                return Err(DatastetError::InvalidDocument(format!(
                    "tokens of sequence {} do not match its text",
                    sequence.id.clone().unwrap_or_else(|| index.to_string())
                )));
            }

            let mut cursor = base;
            for token in sequence.tokens.iter_mut() {
                token.offset = cursor;
                cursor += token.text.len();
            }
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_tokenizes_and_shifts() {
        let doc = Document::new(vec![
            DocumentSequence::new("First one. "),
            DocumentSequence::new("Second."),
        ])
        .prepare()
        .unwrap();

        assert_eq!(doc.sequence_offsets(), vec![0, 11]);
        assert_eq!(doc.sequences[1].tokens[0].text, "Second");
        assert_eq!(doc.sequences[1].tokens[0].offset, 11);
    }

    #[test]
    fn test_prepare_rejects_misaligned_tokens() {
        let mut sequence = DocumentSequence::new("abc def");
        sequence.tokens = vec![Token::new("abc", 0), Token::new("xyz", 3)];
        let result = Document::new(vec![sequence]).prepare();
        assert!(matches!(result, Err(DatastetError::InvalidDocument(_))));
    }

    #[test]
    fn test_prepare_rejects_empty_document() {
        assert!(Document::default().prepare().is_err());
    }

    #[test]
    fn test_token_span() {
        let doc = Document::new(vec![DocumentSequence::new("The GSE12345 dataset")])
            .prepare()
            .unwrap();
        let span = doc.sequences[0].token_span(2, 2);
        assert_eq!(span, OffsetSpan::new(4, 12));
    }

    #[test]
    fn test_annotation_cover() {
        let bbox = BoundingBox {
            page: 1,
            x: 10.0,
            y: 10.0,
            width: 50.0,
            height: 10.0,
        };
        let annotation = PdfAnnotation {
            annotation_type: AnnotationType::Uri,
            destination: "https://zenodo.org/record/1".to_string(),
            boxes: vec![bbox],
        };
        let inside = Token::new("zenodo", 0).with_bounding_box(BoundingBox {
            page: 1,
            x: 20.0,
            y: 12.0,
            width: 5.0,
            height: 5.0,
        });
        let other_page = Token::new("zenodo", 0).with_bounding_box(BoundingBox { page: 2, ..bbox });
        assert!(annotation.covers(&inside));
        assert!(!annotation.covers(&other_page));
        assert!(!annotation.covers(&Token::new("plain", 0)));
    }
}
