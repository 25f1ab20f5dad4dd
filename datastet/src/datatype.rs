//! Data type classification of the sentences holding implicit datasets.
//!
//! The sentence classifier scores whether a sentence introduces data
//! (`has_dataset` / `no_dataset`) and which kind of data it is. The best kind
//! and the `has_dataset` score are copied onto the `dataset` component of the
//! records found in that sentence.

use crate::model::{ComponentType, Dataset, Document};
use crate::services::DatatypeClassifier;
use crate::{DatastetError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

const NON_TYPE_FIELDS: [&str; 3] = ["has_dataset", "no_dataset", "text"];

/// Classification of one sentence
#[derive(Debug, Clone, PartialEq)]
pub struct DatatypeResult {
    /// Highest scoring data type, `None` when every type scored 0
    pub best_type: Option<String>,
    pub best_score: f64,
    pub has_dataset_score: f64,
}

impl DatatypeResult {
    /// Read one entry of the `classifications` array.
    ///
    /// Ties between data types go to the first name in alphabetical order.
    pub fn from_json(entry: &Value) -> Self {
        let mut scores: BTreeMap<&str, f64> = BTreeMap::new();
        let mut has_dataset_score = 0.0;
        if let Some(fields) = entry.as_object() {
            for (field, value) in fields {
                let Some(score) = value.as_f64() else {
                    continue;
                };
                if field == "has_dataset" {
                    has_dataset_score = score;
                } else if !NON_TYPE_FIELDS.contains(&field.as_str()) {
                    scores.insert(field.as_str(), score);
                }
            }
        }

        let mut best_type = None;
        let mut best_score = 0.0;
        for (name, score) in scores {
            if score > best_score {
                best_score = score;
                best_type = Some(name.to_string());
            }
        }

        Self {
            best_type,
            best_score,
            has_dataset_score,
        }
    }

    /// Copy the result onto an implicit dataset record.
    ///
    /// Returns false when the record is not of type `dataset` or when no
    /// data type was found.
    pub fn apply(&self, record: &mut Dataset) -> bool {
        if record.dataset_type != ComponentType::Dataset || self.best_type.is_none() {
            return false;
        }
        let Some(dataset) = record.dataset.as_mut() else {
            return false;
        };
        dataset.best_data_type = self.best_type.clone();
        dataset.best_data_type_score = Some(self.best_score);
        dataset.has_dataset_score = Some(self.has_dataset_score);
        true
    }
}

/// Read a classifier answer, one result per entry of `classifications`.
pub fn parse_classifications(answer: &Value) -> Result<Vec<DatatypeResult>> {
    let entries = answer["classifications"].as_array().ok_or_else(|| {
        DatastetError::MalformedResponse("classifier answer has no classifications array".to_string())
    })?;
    Ok(entries.iter().map(DatatypeResult::from_json).collect())
}

/// Runs the sentence classifier over the sequences holding implicit datasets
#[derive(Debug, Clone)]
pub struct DatatypeStage {
    classifier: Arc<dyn DatatypeClassifier>,
}

impl DatatypeStage {
    pub fn new(classifier: Arc<dyn DatatypeClassifier>) -> Self {
        Self { classifier }
    }

    /// Classify in one batch and annotate the records, `records[i]` being the
    /// records of `document.sequences[i]`. Returns the number of records
    /// annotated.
    pub async fn annotate(&self, document: &Document, records: &mut [Vec<Dataset>]) -> Result<usize> {
        let selected: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, local)| local.iter().any(|r| r.dataset_type == ComponentType::Dataset))
            .map(|(index, _)| index)
            .collect();
        if selected.is_empty() {
            return Ok(0);
        }

        let sentences: Vec<String> = selected
            .iter()
            .map(|&index| document.sequences[index].text.clone())
            .collect();
        let answer = self.classifier.classify(&sentences).await?;
        let results = parse_classifications(&answer)?;
        if results.len() != sentences.len() {
            warn!(
                expected = sentences.len(),
                received = results.len(),
                "Data type classifier answered a different number of sentences"
            );
        }

        let mut annotated = 0;
        for (index, result) in selected.into_iter().zip(results.iter()) {
            for record in records[index].iter_mut() {
                if result.apply(record) {
                    annotated += 1;
                }
            }
        }
        debug!(annotated, "Data types assigned");
        Ok(annotated)
    }
}
