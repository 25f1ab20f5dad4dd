//! Entity grouping: a sorted component list of one segment folded into
//! dataset records.
//!
//! The fold is a small state machine. A name or dataset component closes the
//! open record and opens a new one around itself; a device joins the open
//! record only when its anchor is an implicit dataset, preferring the longer
//! description; a URL joins whatever record is open.

use crate::model::{Component, ComponentType, Dataset};

/// State of the grouping fold
#[derive(Debug, Clone, PartialEq)]
pub enum GroupingState {
    /// No record is open
    NoAnchor,
    /// A record anchored on a dataset name is open
    NameAnchor(Dataset),
    /// A record anchored on an implicit dataset is open
    DatasetAnchor(Dataset),
}

impl GroupingState {
    fn open(anchor: &Component) -> Self {
        match Dataset::from_anchor(anchor.clone()) {
            Some(record) if anchor.component_type == ComponentType::DatasetName => {
                GroupingState::NameAnchor(record)
            }
            Some(record) => GroupingState::DatasetAnchor(record),
            None => GroupingState::NoAnchor,
        }
    }

    /// Close the open record, if any.
    pub fn close(self) -> Option<Dataset> {
        match self {
            GroupingState::NoAnchor => None,
            GroupingState::NameAnchor(record) | GroupingState::DatasetAnchor(record) => Some(record),
        }
    }
}

/// One transition: the next state, and the record closed by it.
pub fn step(state: GroupingState, component: &Component) -> (GroupingState, Option<Dataset>) {
    match component.component_type {
        ComponentType::DatasetName | ComponentType::Dataset => {
            (GroupingState::open(component), state.close())
        }
        ComponentType::DataDevice => match state {
            GroupingState::DatasetAnchor(mut record) => {
                record.attach_device(component.clone());
                (GroupingState::DatasetAnchor(record), None)
            }
            other => (other, None),
        },
        ComponentType::Url => match state {
            GroupingState::NameAnchor(mut record) => {
                record.set_url(component.clone());
                (GroupingState::NameAnchor(record), None)
            }
            GroupingState::DatasetAnchor(mut record) => {
                record.set_url(component.clone());
                (GroupingState::DatasetAnchor(record), None)
            }
            GroupingState::NoAnchor => (GroupingState::NoAnchor, None),
        },
        ComponentType::Publisher | ComponentType::Citation => (state, None),
    }
}

/// Group the sorted components of a segment. Every record gets the segment
/// text as context.
pub fn group(components: &[Component], context: &str) -> Vec<Dataset> {
    let mut records = Vec::new();
    let mut state = GroupingState::NoAnchor;

    for component in components {
        let (next, closed) = step(state, component);
        records.extend(closed);
        state = next;
    }
    records.extend(state.close());

    for record in records.iter_mut() {
        record.context = Some(context.to_string());
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OffsetSpan;

    fn component(component_type: ComponentType, raw: &str, start: usize) -> Component {
        Component::new(component_type, raw, OffsetSpan::new(start, start + raw.len()))
    }

    #[test]
    fn test_name_with_url() {
        let components = vec![
            component(ComponentType::DatasetName, "GSE12345", 4),
            component(ComponentType::Url, "https://osf.io/abc123", 37),
        ];
        let records = group(&components, "context");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].dataset_type, ComponentType::DatasetName);
        assert_eq!(records[0].raw_form, "GSE12345");
        assert_eq!(records[0].url.as_ref().unwrap().raw_form, "https://osf.io/abc123");
        assert_eq!(records[0].context.as_deref(), Some("context"));
    }

    #[test]
    fn test_device_requires_dataset_anchor() {
        let components = vec![
            component(ComponentType::DatasetName, "ImageNet", 0),
            component(ComponentType::DataDevice, "camera", 10),
            component(ComponentType::Dataset, "images", 20),
            component(ComponentType::DataDevice, "MRI", 30),
            component(ComponentType::DataDevice, "MRI scanner", 40),
            component(ComponentType::DataDevice, "CT", 55),
        ];
        let records = group(&components, "");

        assert_eq!(records.len(), 2);
        assert!(records[0].data_device.is_none());
        assert_eq!(records[1].data_device.as_ref().unwrap().raw_form, "MRI scanner");
    }

    #[test]
    fn test_components_before_any_anchor_are_ignored() {
        let components = vec![
            component(ComponentType::Url, "https://a.org", 0),
            component(ComponentType::DataDevice, "MRI", 20),
        ];
        assert!(group(&components, "").is_empty());
    }

    #[test]
    fn test_latest_url_wins() {
        let components = vec![
            component(ComponentType::Dataset, "data", 0),
            component(ComponentType::Url, "https://a.org", 10),
            component(ComponentType::Url, "https://b.org", 30),
        ];
        let records = group(&components, "");
        assert_eq!(records[0].url.as_ref().unwrap().raw_form, "https://b.org");
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let components = vec![
            component(ComponentType::Dataset, "sequencing data", 0),
            component(ComponentType::DataDevice, "Illumina", 20),
            component(ComponentType::DatasetName, "GEO", 40),
            component(ComponentType::Url, "https://ncbi.nlm.nih.gov/geo", 50),
        ];
        assert_eq!(group(&components, "text"), group(&components, "text"));
    }
}
