//! JSON rendering of processed documents.
//!
//! Offsets are character positions. Component offsets are relative to the
//! record context; `contextOffset` places the context in the document text.

use crate::model::{
    BiblioComponent, BoundingBox, Component, ContextAttributes, Dataset, RoleDecision, byte_to_char,
};
use crate::pipeline::ProcessedDocument;
use chrono::Utc;
use serde_json::{Map, Value, json};

/// Name reported in the output envelope
pub const APPLICATION: &str = "datastet";

fn insert_opt<T: Into<Value>>(object: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        object.insert(key.to_string(), value.into());
    }
}

fn bounding_box_json(bounding_box: &BoundingBox) -> Value {
    json!({
        "p": bounding_box.page,
        "x": bounding_box.x,
        "y": bounding_box.y,
        "w": bounding_box.width,
        "h": bounding_box.height,
    })
}

/// JSON of one component, offsets counted in characters of `context`.
pub fn component_json(component: &Component, context: &str) -> Value {
    let mut object = Map::new();
    object.insert("rawForm".to_string(), component.raw_form.clone().into());
    object.insert("normalizedForm".to_string(), component.normalized_form.clone().into());
    object.insert(
        "offsetStart".to_string(),
        byte_to_char(context, component.offsets.start).into(),
    );
    object.insert(
        "offsetEnd".to_string(),
        byte_to_char(context, component.offsets.end).into(),
    );
    insert_opt(&mut object, "url", component.destination.clone());
    insert_opt(&mut object, "wikidataId", component.wikidata_id.clone());
    insert_opt(&mut object, "wikipediaExternalRef", component.wikipedia_external_ref);
    insert_opt(&mut object, "lang", component.lang.clone());
    insert_opt(&mut object, "confidence", component.disambiguation_score);
    insert_opt(&mut object, "bestDataType", component.best_data_type.clone());
    insert_opt(&mut object, "bestTypeScore", component.best_data_type_score);
    insert_opt(&mut object, "hasDataset", component.has_dataset_score);
    if !component.bounding_boxes.is_empty() {
        object.insert(
            "boundingBoxes".to_string(),
            component.bounding_boxes.iter().map(bounding_box_json).collect(),
        );
    }
    Value::Object(object)
}

/// JSON of a citation marker.
pub fn citation_json(citation: &BiblioComponent) -> Value {
    let mut object = Map::new();
    object.insert("refKey".to_string(), citation.ref_key.clone().into());
    object.insert("label".to_string(), citation.raw_form.clone().into());
    if let Some(item) = &citation.item {
        insert_opt(&mut object, "title", item.title.clone());
        insert_opt(&mut object, "doi", item.doi.clone());
        insert_opt(&mut object, "year", item.year.clone());
    }
    Value::Object(object)
}

fn decision_json(decision: &RoleDecision) -> Value {
    json!({ "value": decision.value, "score": decision.score })
}

fn attributes_json(attributes: &ContextAttributes) -> Value {
    json!({
        "used": decision_json(&attributes.used),
        "created": decision_json(&attributes.created),
        "shared": decision_json(&attributes.shared),
    })
}

/// JSON of one mention record. `text` is the document text the record was
/// extracted from.
pub fn mention_json(record: &Dataset, text: &str) -> Value {
    let context = record.context.as_deref().unwrap_or_default();
    let mut object = Map::new();
    object.insert("id".to_string(), record.id.to_string().into());
    object.insert("rawForm".to_string(), record.raw_form.clone().into());
    object.insert("type".to_string(), record.dataset_type.as_str().into());

    for component in [&record.dataset_name, &record.dataset, &record.data_device, &record.url, &record.publisher]
        .into_iter()
        .flatten()
    {
        object.insert(
            component.component_type.as_str().to_string(),
            component_json(component, context),
        );
    }

    if let Some(anchor) = record.anchor() {
        object.insert("normalizedForm".to_string(), anchor.normalized_form.clone().into());
        insert_opt(&mut object, "wikidataId", anchor.wikidata_id.clone());
        insert_opt(&mut object, "wikipediaExternalRef", anchor.wikipedia_external_ref);
    }
    insert_opt(&mut object, "lang", record.lang.clone());
    object.insert("confidence".to_string(), record.conf.into());
    insert_opt(&mut object, "context", record.context.clone());
    insert_opt(
        &mut object,
        "contextOffset",
        record.global_context_offset.map(|offset| byte_to_char(text, offset)),
    );
    insert_opt(&mut object, "paragraph", record.paragraph.clone());

    if !record.citations.is_empty() {
        object.insert(
            "references".to_string(),
            record.citations.iter().map(citation_json).collect(),
        );
    }
    if let Some(attributes) = &record.mention_context_attributes {
        object.insert("mentionContextAttributes".to_string(), attributes_json(attributes));
    }
    if let Some(attributes) = &record.document_context_attributes {
        object.insert("documentContextAttributes".to_string(), attributes_json(attributes));
    }
    object.insert(
        "inDataAvailabilitySection".to_string(),
        record.in_data_availability_section.into(),
    );
    if record.propagated {
        object.insert("propagated".to_string(), true.into());
    }
    Value::Object(object)
}

/// JSON of a processed document, with the application envelope.
pub fn document_json(processed: &ProcessedDocument) -> Value {
    json!({
        "application": APPLICATION,
        "version": crate::VERSION,
        "date": Utc::now().to_rfc3339(),
        "runtime": processed.runtime_ms,
        "mentions": processed
            .records
            .iter()
            .map(|record| mention_json(record, &processed.text))
            .collect::<Vec<_>>(),
        "references": processed.citations.iter().map(citation_json).collect::<Vec<_>>(),
    })
}
