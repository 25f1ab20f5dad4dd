//! Role classification of mention contexts and its document-level
//! aggregation.
//!
//! Each mention context is scored on three axes (used, created, shared),
//! either by three binary models or by one multi-label model. Mentions of
//! the same dataset name then share one verdict per axis: the decision is the
//! OR of the member decisions and the score the maximum member score.

use crate::config::{ClassifierMode, ContextConfig};
use crate::model::{ContextAttributes, Dataset, MentionId, RoleAxis, RoleDecision};
use crate::services::{ContextClassifier, ContextModel};
use crate::{DatastetError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

lazy_static! {
    static ref LINE_HYPHEN: Regex = Regex::new(r"(\p{L})-[ \t]*\n[ \t]*(\p{Ll})").unwrap();
    static ref SPACES: Regex = Regex::new(r" +").unwrap();
}

/// Text sent to the classifier for a context: words broken over a line end
/// are joined, newlines become spaces and runs of spaces collapse.
pub fn clean_context(context: &str) -> String {
    let joined = LINE_HYPHEN.replace_all(context, "$1$2");
    let flat = joined.replace('\n', " ");
    SPACES.replace_all(&flat, " ").into_owned()
}

/// Class names of an axis in the classifier answers: the multi-label field,
/// and the positive and negative fields of the binary model.
fn axis_fields(axis: RoleAxis) -> (&'static str, &'static str) {
    match axis {
        RoleAxis::Used => ("used", "not_used"),
        RoleAxis::Created => ("creation", "not_creation"),
        RoleAxis::Shared => ("shared", "not_shared"),
    }
}

fn axis_model(axis: RoleAxis) -> ContextModel {
    match axis {
        RoleAxis::Used => ContextModel::Used,
        RoleAxis::Created => ContextModel::Creation,
        RoleAxis::Shared => ContextModel::Shared,
    }
}

/// Decision of a binary model.
///
/// The positive class wins when its score beats both the threshold and the
/// negative score. The stored score is the positive score when it beats the
/// negative one, otherwise the complement of the negative score.
pub fn binary_decision(positive: f64, negative: Option<f64>, threshold: f64) -> RoleDecision {
    match negative {
        Some(negative) => {
            let score = if positive > negative { positive } else { 1.0 - negative };
            RoleDecision::new(positive > threshold && positive > negative, score)
        }
        None => RoleDecision::new(positive > threshold, positive),
    }
}

/// Entries of a classifier answer, one per submitted context in order.
///
/// A count mismatch is logged; the unmatched mentions stay unscored.
fn classifications(answer: &Value, model: ContextModel, expected: usize) -> Result<&Vec<Value>> {
    let entries = answer["classifications"].as_array().ok_or_else(|| {
        DatastetError::MalformedResponse("classifier answer has no classifications array".to_string())
    })?;
    if entries.len() != expected {
        warn!(
            model = ?model,
            expected,
            received = entries.len(),
            "Classifier answered a different number of contexts"
        );
    }
    Ok(entries)
}

/// Scores mention contexts and aggregates them per dataset name
#[derive(Debug, Clone)]
pub struct ContextAggregator {
    classifier: Arc<dyn ContextClassifier>,
    mode: ClassifierMode,
    threshold: f64,
}

impl ContextAggregator {
    pub fn new(classifier: Arc<dyn ContextClassifier>, config: &ContextConfig) -> Self {
        Self {
            classifier,
            mode: config.mode,
            threshold: config.decision_threshold,
        }
    }

    pub fn mode(&self) -> ClassifierMode {
        self.mode
    }

    /// Classify every mention, then aggregate.
    ///
    /// Either every request succeeds and the mention attributes are written,
    /// or an error is returned and no record is touched.
    pub async fn classify(&self, records: &mut [Dataset]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let ids: Vec<MentionId> = records.iter().map(|r| r.id).collect();
        let texts: Vec<String> = records
            .iter()
            .map(|r| r.context.as_deref().map(clean_context).unwrap_or_default())
            .collect();

        let scored = match self.mode {
            ClassifierMode::Binary => self.score_binary(&ids, &texts).await?,
            ClassifierMode::MultiLabel => self.score_multi_label(&ids, &texts).await?,
        };

        for record in records.iter_mut() {
            if let Some(attributes) = scored.get(&record.id) {
                record.mention_context_attributes = Some(*attributes);
            }
        }
        info!(mentions = scored.len(), mode = %self.mode, "Classified mention contexts");

        Ok(aggregate(records))
    }

    async fn score_multi_label(
        &self,
        ids: &[MentionId],
        texts: &[String],
    ) -> Result<HashMap<MentionId, ContextAttributes>> {
        let answer = self.classifier.classify(texts, ContextModel::All).await?;
        let mut scored = HashMap::new();
        for (id, entry) in ids.iter().zip(classifications(&answer, ContextModel::All, ids.len())?) {
            let mut attributes = ContextAttributes::default();
            for axis in RoleAxis::ALL {
                let (field, _) = axis_fields(axis);
                let score = entry[field].as_f64().unwrap_or(0.0);
                attributes.set(axis, RoleDecision::new(score > self.threshold, score));
            }
            scored.insert(*id, attributes);
        }
        Ok(scored)
    }

    async fn score_binary(
        &self,
        ids: &[MentionId],
        texts: &[String],
    ) -> Result<HashMap<MentionId, ContextAttributes>> {
        let mut answers = Vec::with_capacity(RoleAxis::ALL.len());
        for axis in RoleAxis::ALL {
            answers.push((axis, self.classifier.classify(texts, axis_model(axis)).await?));
        }

        let mut scored: HashMap<MentionId, ContextAttributes> = HashMap::new();
        for (axis, answer) in &answers {
            let (positive, negative) = axis_fields(*axis);
            let entries = classifications(answer, axis_model(*axis), ids.len())?;
            for (id, entry) in ids.iter().zip(entries) {
                let decision = binary_decision(
                    entry[positive].as_f64().unwrap_or(0.0),
                    entry[negative].as_f64(),
                    self.threshold,
                );
                scored.entry(*id).or_default().set(*axis, decision);
            }
        }
        Ok(scored)
    }
}

/// Share the mention verdicts across mentions of the same dataset name.
///
/// Mentions are grouped by the raw form of their dataset name and, when it
/// differs, by its normalized form as well, so a mention may sit in two
/// groups. Each group's verdict is merged into the document attributes of
/// its members. Returns the number of groups.
pub fn aggregate(records: &mut [Dataset]) -> usize {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        let Some(name) = &record.dataset_name else {
            continue;
        };
        if name.raw_form.is_empty() {
            continue;
        }
        groups.entry(name.raw_form.clone()).or_default().push(index);
        if !name.normalized_form.is_empty() && name.normalized_form != name.raw_form {
            groups.entry(name.normalized_form.clone()).or_default().push(index);
        }
    }

    for (name, members) in &groups {
        let mut verdict = ContextAttributes::default();
        for axis in RoleAxis::ALL {
            let mut any = false;
            let mut best: f64 = 0.0;
            for &index in members {
                let decision = records[index]
                    .mention_context_attributes
                    .map(|attributes| attributes.get(axis))
                    .unwrap_or_default();
                any |= decision.value == Some(true);
                best = best.max(decision.score);
            }
            verdict.set(axis, RoleDecision::new(any, best));
        }
        for &index in members {
            records[index].merge_document_context_attributes(&verdict);
        }
        debug!(name = %name, mentions = members.len(), "Aggregated context attributes");
    }
    groups.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, ComponentType, OffsetSpan};
    use crate::services::MockContextClassifier;
    use serde_json::json;

    fn mention(raw: &str, context: &str) -> Dataset {
        let name = Component::new(ComponentType::DatasetName, raw, OffsetSpan::new(0, raw.len()));
        let mut record = Dataset::from_anchor(name).unwrap();
        record.context = Some(context.to_string());
        record
    }

    fn config(mode: ClassifierMode) -> ContextConfig {
        ContextConfig {
            enabled: true,
            mode,
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_context() {
        assert_eq!(
            clean_context("we re-\nanalysed the  data\nfrom GEO"),
            "we reanalysed the data from GEO"
        );
    }

    #[test]
    fn test_binary_decision() {
        assert_eq!(binary_decision(0.8, Some(0.2), 0.5), RoleDecision::new(true, 0.8));
        let lost = binary_decision(0.3, Some(0.6), 0.5);
        assert_eq!(lost.value, Some(false));
        assert!((lost.score - 0.4).abs() < 1e-9);
        // beats the negative score but not the threshold
        assert_eq!(binary_decision(0.45, Some(0.1), 0.5), RoleDecision::new(false, 0.45));
        assert_eq!(binary_decision(0.7, None, 0.5), RoleDecision::new(true, 0.7));
    }

    #[test]
    fn test_aggregation_takes_or_and_max() {
        let mut records = vec![mention("GSE1", "a"), mention("GSE1", "b"), mention("GSE1", "c")];
        for (record, (value, score)) in records.iter_mut().zip([(false, 0.2), (true, 0.9), (false, 0.4)]) {
            let mut attributes = ContextAttributes::default();
            attributes.set(RoleAxis::Used, RoleDecision::new(value, score));
            record.mention_context_attributes = Some(attributes);
        }

        assert_eq!(aggregate(&mut records), 1);
        for record in &records {
            let document = record.document_context_attributes.unwrap();
            assert_eq!(document.used, RoleDecision::new(true, 0.9));
            assert_eq!(document.created.value, Some(false));
        }
    }

    #[test]
    fn test_raw_and_normalized_groups() {
        let mut broken = mention("Human\nConnectome", "x");
        broken.mention_context_attributes = Some(ContextAttributes {
            shared: RoleDecision::new(true, 0.8),
            ..Default::default()
        });
        let plain = mention("Human Connectome", "y");
        let unnamed = Dataset::from_anchor(Component::new(ComponentType::Dataset, "data", OffsetSpan::new(0, 4))).unwrap();
        let mut records = vec![broken, plain, unnamed];

        assert_eq!(aggregate(&mut records), 2);
        assert_eq!(records[1].document_context_attributes.unwrap().shared, RoleDecision::new(true, 0.8));
        assert!(records[2].document_context_attributes.is_none());
    }

    #[tokio::test]
    async fn test_multi_label_mode() {
        let mut classifier = MockContextClassifier::new();
        classifier
            .expect_classify()
            .times(1)
            .withf(|texts, model| texts.len() == 2 && *model == ContextModel::All)
            .returning(|_, _| {
                Ok(json!({"classifications": [
                    {"used": 0.9, "creation": 0.1, "shared": 0.2, "text": "a"},
                    {"used": 0.3, "creation": 0.7, "shared": 0.1, "text": "b"}
                ]}))
            });

        let aggregator = ContextAggregator::new(Arc::new(classifier), &config(ClassifierMode::MultiLabel));
        let mut records = vec![mention("GSE1", "a"), mention("GSE1", "b")];
        aggregator.classify(&mut records).await.unwrap();

        let first = records[0].mention_context_attributes.unwrap();
        assert_eq!(first.used, RoleDecision::new(true, 0.9));
        assert_eq!(first.created, RoleDecision::new(false, 0.1));
        let document = records[1].document_context_attributes.unwrap();
        assert_eq!(document.used, RoleDecision::new(true, 0.9));
        assert_eq!(document.created, RoleDecision::new(true, 0.7));
    }

    #[tokio::test]
    async fn test_short_answer_leaves_trailing_mentions_unscored() {
        let mut classifier = MockContextClassifier::new();
        classifier.expect_classify().times(1).returning(|_, _| {
            Ok(json!({"classifications": [
                {"used": 0.9, "creation": 0.1, "shared": 0.2}
            ]}))
        });

        let aggregator = ContextAggregator::new(Arc::new(classifier), &config(ClassifierMode::MultiLabel));
        let mut records = vec![mention("GSE1", "a"), mention("ERP2", "b")];
        aggregator.classify(&mut records).await.unwrap();

        assert_eq!(
            records[0].mention_context_attributes.unwrap().used,
            RoleDecision::new(true, 0.9)
        );
        assert!(records[1].mention_context_attributes.is_none());
        assert_eq!(
            records[1].document_context_attributes.unwrap().used,
            RoleDecision::new(false, 0.0)
        );
    }

    #[tokio::test]
    async fn test_binary_mode_failure_leaves_records_untouched() {
        let mut classifier = MockContextClassifier::new();
        classifier
            .expect_classify()
            .withf(|_, model| *model == ContextModel::Used)
            .returning(|_, _| Ok(json!({"classifications": [{"used": 0.9, "not_used": 0.1}]})));
        classifier
            .expect_classify()
            .withf(|_, model| *model == ContextModel::Creation)
            .returning(|_, _| Err(DatastetError::Service("down".to_string())));

        let aggregator = ContextAggregator::new(Arc::new(classifier), &config(ClassifierMode::Binary));
        let mut records = vec![mention("GSE1", "a")];
        assert!(aggregator.classify(&mut records).await.is_err());
        assert!(records[0].mention_context_attributes.is_none());
        assert!(records[0].document_context_attributes.is_none());
    }
}
