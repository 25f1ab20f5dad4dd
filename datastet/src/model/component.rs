//! Typed, offset-anchored spans extracted from a segment.

use super::{BoundingBox, OffsetSpan, Token, bounding_boxes};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of span recognised in a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    /// Explicitly named dataset ("GSE12345", "ImageNet")
    DatasetName,
    /// Implicit dataset description ("the sequencing data")
    Dataset,
    /// Instrument or device that produced the data
    DataDevice,
    /// Web address
    Url,
    /// Data publisher or repository
    Publisher,
    /// Bibliographic reference marker
    Citation,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::DatasetName => "dataset-name",
            ComponentType::Dataset => "dataset",
            ComponentType::DataDevice => "data-device",
            ComponentType::Url => "url",
            ComponentType::Publisher => "publisher",
            ComponentType::Citation => "citation",
        }
    }

    /// Map a tagger label such as `I-<dataset-name>` or `<data-device>` to a type.
    ///
    /// Returns `None` for `<other>` and unknown labels.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_start_matches("I-");
        let inner = label.trim_start_matches('<').trim_end_matches('>');
        match inner {
            "dataset-name" => Some(ComponentType::DatasetName),
            "dataset" => Some(ComponentType::Dataset),
            "data-device" => Some(ComponentType::DataDevice),
            "url" => Some(ComponentType::Url),
            "publisher" => Some(ComponentType::Publisher),
            _ => None,
        }
    }

    /// Tagger label for this type
    pub fn label(&self) -> String {
        format!("<{}>", self.as_str())
    }

    /// Whether a record can be built around a component of this type
    pub fn is_anchor(&self) -> bool {
        matches!(self, ComponentType::DatasetName | ComponentType::Dataset)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "citation" => Ok(ComponentType::Citation),
            other => ComponentType::from_label(other)
                .ok_or_else(|| format!("Invalid component type: {}", s)),
        }
    }
}

/// Stable identifier of a component, assigned at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub Uuid);

impl ComponentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newlines become spaces, runs of spaces collapse, surrounding blanks are trimmed.
pub fn normalize_raw_form(raw: &str) -> String {
    raw.replace('\n', " ")
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// A typed span of a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Stable identifier
    pub id: ComponentId,
    /// Kind of span
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    /// Text exactly as it appears in the segment
    pub raw_form: String,
    /// Whitespace-normalized text, or the link destination for URLs
    pub normalized_form: String,
    /// Segment-relative offsets
    pub offsets: OffsetSpan,
    /// Tokens covered by the span
    #[serde(default, skip_serializing)]
    pub tokens: Vec<Token>,
    /// Page areas covered by the span
    #[serde(default)]
    pub bounding_boxes: Vec<BoundingBox>,
    /// Tagger label that produced the span
    pub label: String,
    /// Link destination of a URL span
    #[serde(default)]
    pub destination: Option<String>,
    /// Set when disambiguation judges the span a false positive
    #[serde(default)]
    pub filtered: bool,
    #[serde(default)]
    pub wikidata_id: Option<String>,
    #[serde(default)]
    pub wikipedia_external_ref: Option<i64>,
    /// Confidence of the knowledge-base match
    #[serde(default)]
    pub disambiguation_score: Option<f64>,
    #[serde(default)]
    pub lang: Option<String>,
    /// Best data type assigned by the sentence classifier
    #[serde(default)]
    pub best_data_type: Option<String>,
    #[serde(default)]
    pub best_data_type_score: Option<f64>,
    /// Probability that the sentence introduces a dataset
    #[serde(default)]
    pub has_dataset_score: Option<f64>,
    /// Sequence the span was extracted from
    #[serde(default)]
    pub sequence_id: Option<String>,
}

impl Component {
    /// Create a component; the normalized form is derived from the raw form.
    pub fn new(component_type: ComponentType, raw_form: impl Into<String>, offsets: OffsetSpan) -> Self {
        let raw_form = raw_form.into();
        Self {
            id: ComponentId::new(),
            component_type,
            normalized_form: normalize_raw_form(&raw_form),
            raw_form,
            offsets,
            tokens: Vec::new(),
            bounding_boxes: Vec::new(),
            label: component_type.label(),
            destination: None,
            filtered: false,
            wikidata_id: None,
            wikipedia_external_ref: None,
            disambiguation_score: None,
            lang: None,
            best_data_type: None,
            best_data_type_score: None,
            has_dataset_score: None,
            sequence_id: None,
        }
    }

    /// Attach the covered tokens and derive the bounding boxes from them.
    pub fn with_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.bounding_boxes = bounding_boxes(&tokens);
        self.tokens = tokens;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Record the link destination; it becomes the normalized form, spaces removed.
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        let destination = destination.into();
        self.normalized_form = destination.replace(' ', "");
        self.destination = Some(destination);
        self
    }

    pub fn with_sequence_id(mut self, sequence_id: Option<String>) -> Self {
        self.sequence_id = sequence_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(
            ComponentType::from_label("I-<dataset-name>"),
            Some(ComponentType::DatasetName)
        );
        assert_eq!(
            ComponentType::from_label("<data-device>"),
            Some(ComponentType::DataDevice)
        );
        assert_eq!(ComponentType::from_label("<other>"), None);
        assert_eq!(
            "citation".parse::<ComponentType>(),
            Ok(ComponentType::Citation)
        );
        assert!("bogus".parse::<ComponentType>().is_err());
    }

    #[test]
    fn test_normalize_raw_form() {
        assert_eq!(normalize_raw_form("  Gene\nExpression   Omnibus "), "Gene Expression Omnibus");
        assert_eq!(normalize_raw_form("\n"), "");
    }

    #[test]
    fn test_destination_becomes_normalized_form() {
        let url = Component::new(ComponentType::Url, "https://osf.io/ abc", OffsetSpan::new(0, 19))
            .with_destination("https://osf.io/ abc123");
        assert_eq!(url.normalized_form, "https://osf.io/abc123");
        assert_eq!(url.raw_form, "https://osf.io/ abc");
    }

    #[test]
    fn test_type_serialization() {
        let json = serde_json::to_string(&ComponentType::DataDevice).unwrap();
        assert_eq!(json, "\"data-device\"");
    }
}
