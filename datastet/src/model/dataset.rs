//! Dataset records: the document-level entities built around an anchor.

use super::{BiblioComponent, Component, ComponentId, ComponentType, ContextAttributes, OffsetSpan};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default confidence of a record
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Stable identifier of a dataset mention
///
/// Derived from the anchor component, so regrouping the same components yields
/// the same identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MentionId(pub Uuid);

impl From<ComponentId> for MentionId {
    fn from(id: ComponentId) -> Self {
        Self(id.0)
    }
}

impl fmt::Display for MentionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One dataset mention with its attached components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Stable identifier
    pub id: MentionId,
    /// Type of the anchor: `dataset-name` or `dataset`
    #[serde(rename = "type")]
    pub dataset_type: ComponentType,
    /// Raw form of the anchor
    pub raw_form: String,
    pub dataset_name: Option<Component>,
    pub dataset: Option<Component>,
    /// Only present when the anchor is an implicit `dataset`
    pub data_device: Option<Component>,
    pub url: Option<Component>,
    pub publisher: Option<Component>,
    /// Citation markers attached to the mention
    #[serde(default)]
    pub citations: Vec<BiblioComponent>,
    /// Text of the segment the mention was found in
    pub context: Option<String>,
    /// Wider context, when available
    pub paragraph: Option<String>,
    /// Document-level offset of the context start
    pub global_context_offset: Option<usize>,
    pub conf: f64,
    pub lang: Option<String>,
    pub filtered: bool,
    /// Created by term propagation rather than by the tagger
    pub propagated: bool,
    pub in_data_availability_section: bool,
    pub mention_context_attributes: Option<ContextAttributes>,
    pub document_context_attributes: Option<ContextAttributes>,
    /// Sequence the mention was found in
    pub sequence_id: Option<String>,
}

impl Dataset {
    /// Open a record around an anchor component.
    ///
    /// Returns `None` when the component cannot anchor a record.
    pub fn from_anchor(anchor: Component) -> Option<Self> {
        let dataset_type = anchor.component_type;
        let mut record = Self {
            id: MentionId::from(anchor.id),
            dataset_type,
            raw_form: anchor.raw_form.clone(),
            dataset_name: None,
            dataset: None,
            data_device: None,
            url: None,
            publisher: None,
            citations: Vec::new(),
            context: None,
            paragraph: None,
            global_context_offset: None,
            conf: DEFAULT_CONFIDENCE,
            lang: None,
            filtered: false,
            propagated: false,
            in_data_availability_section: false,
            mention_context_attributes: None,
            document_context_attributes: None,
            sequence_id: anchor.sequence_id.clone(),
        };
        match dataset_type {
            ComponentType::DatasetName => record.dataset_name = Some(anchor),
            ComponentType::Dataset => record.dataset = Some(anchor),
            _ => return None,
        }
        Some(record)
    }

    /// The component the record is built around.
    pub fn anchor(&self) -> Option<&Component> {
        match self.dataset_type {
            ComponentType::DatasetName => self.dataset_name.as_ref(),
            _ => self.dataset.as_ref(),
        }
    }

    /// Normalized form of the anchor
    pub fn normalized_form(&self) -> Option<&str> {
        self.anchor().map(|a| a.normalized_form.as_str())
    }

    /// Attach a device, only to an implicit-dataset anchor.
    ///
    /// An already attached device is replaced only by a strictly longer one.
    pub fn attach_device(&mut self, device: Component) -> bool {
        if self.dataset.is_none() {
            return false;
        }
        let replace = match &self.data_device {
            None => true,
            Some(existing) => existing.raw_form.len() < device.raw_form.len(),
        };
        if replace {
            self.data_device = Some(device);
        }
        replace
    }

    /// All attached components.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        [
            self.dataset_name.as_ref(),
            self.dataset.as_ref(),
            self.data_device.as_ref(),
            self.url.as_ref(),
            self.publisher.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    /// All attached components, mutably.
    pub fn components_mut(&mut self) -> impl Iterator<Item = &mut Component> {
        [
            self.dataset_name.as_mut(),
            self.dataset.as_mut(),
            self.data_device.as_mut(),
            self.url.as_mut(),
            self.publisher.as_mut(),
        ]
        .into_iter()
        .flatten()
    }

    /// Record the document-level offset of the context; every attached
    /// component receives the same shift.
    pub fn set_global_context_offset(&mut self, offset: usize) {
        self.global_context_offset = Some(offset);
        for component in self.components_mut() {
            component.offsets = component.offsets.with_shift(offset);
        }
    }

    /// Attach a URL, aligning its shift with the record.
    pub fn set_url(&mut self, mut url: Component) {
        if let Some(shift) = self.global_context_offset {
            url.offsets = url.offsets.with_shift(shift);
        }
        self.url = Some(url);
    }

    /// Document-level span of the context, when both are known.
    pub fn context_span(&self) -> Option<OffsetSpan> {
        let context = self.context.as_ref()?;
        let start = self.global_context_offset?;
        Some(OffsetSpan::document(start, start + context.len()))
    }

    /// Fold document-level attributes into the record.
    pub fn merge_document_context_attributes(&mut self, attributes: &ContextAttributes) {
        match &mut self.document_context_attributes {
            Some(existing) => existing.merge(attributes),
            None => self.document_context_attributes = Some(*attributes),
        }
    }

    /// Propagate a filtering decision from any sub-component to the record.
    pub fn refresh_filtered(&mut self) {
        if self.components().any(|c| c.filtered) {
            self.filtered = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoleDecision;

    fn component(kind: ComponentType, raw: &str, start: usize) -> Component {
        Component::new(kind, raw, OffsetSpan::new(start, start + raw.len()))
    }

    #[test]
    fn test_only_anchors_open_records() {
        assert!(Dataset::from_anchor(component(ComponentType::DataDevice, "MiSeq", 0)).is_none());
        let record = Dataset::from_anchor(component(ComponentType::DatasetName, "GSE12345", 4)).unwrap();
        assert_eq!(record.dataset_type, ComponentType::DatasetName);
        assert_eq!(record.raw_form, "GSE12345");
        assert_eq!(record.conf, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_device_needs_dataset_anchor() {
        let mut named = Dataset::from_anchor(component(ComponentType::DatasetName, "GSE1", 0)).unwrap();
        assert!(!named.attach_device(component(ComponentType::DataDevice, "MiSeq", 10)));
        assert!(named.data_device.is_none());

        let mut implicit = Dataset::from_anchor(component(ComponentType::Dataset, "reads", 0)).unwrap();
        assert!(implicit.attach_device(component(ComponentType::DataDevice, "MiSeq", 10)));
        assert!(!implicit.attach_device(component(ComponentType::DataDevice, "Hi", 20)));
        assert!(implicit.attach_device(component(ComponentType::DataDevice, "Illumina MiSeq", 30)));
        assert_eq!(implicit.data_device.unwrap().raw_form, "Illumina MiSeq");
    }

    #[test]
    fn test_shift_applies_to_components() {
        let mut record = Dataset::from_anchor(component(ComponentType::DatasetName, "GSE1", 4)).unwrap();
        record.context = Some("The GSE1 data".to_string());
        record.set_global_context_offset(100);
        let name = record.dataset_name.as_ref().unwrap();
        assert_eq!(name.offsets.global_start(), 104);
        assert_eq!(record.context_span(), Some(OffsetSpan::document(100, 113)));

        record.set_url(component(ComponentType::Url, "https://osf.io/x", 9));
        assert_eq!(record.url.as_ref().unwrap().offsets.global_start(), 109);
    }

    #[test]
    fn test_merge_document_attributes() {
        let mut record = Dataset::from_anchor(component(ComponentType::DatasetName, "GSE1", 0)).unwrap();
        let mut attrs = ContextAttributes::default();
        attrs.used = RoleDecision::new(true, 0.9);
        record.merge_document_context_attributes(&attrs);
        attrs.used = RoleDecision::new(false, 0.95);
        record.merge_document_context_attributes(&attrs);
        let merged = record.document_context_attributes.unwrap();
        assert_eq!(merged.used, RoleDecision::new(true, 0.95));
    }

    #[test]
    fn test_filter_flag_propagates() {
        let mut record = Dataset::from_anchor(component(ComponentType::DatasetName, "GSE1", 0)).unwrap();
        record.refresh_filtered();
        assert!(!record.filtered);
        if let Some(name) = record.dataset_name.as_mut() {
            name.filtered = true;
        }
        record.refresh_filtered();
        assert!(record.filtered);
    }
}
