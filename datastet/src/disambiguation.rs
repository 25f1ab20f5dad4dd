//! Entity linking of the recognised components and the filter built on the
//! returned knowledge base statements.
//!
//! The filter starts from "keep" and its rules can only confirm that
//! decision: under the current rule set no component is ever filtered on
//! knowledge grounds. The cascade is kept so that a stricter starting point
//! can be introduced without touching the callers.

use crate::config::DisambiguationConfig;
use crate::model::{ComponentType, Dataset, Document, byte_to_char};
use crate::services::{DisambiguationQuery, Disambiguator};
use crate::{DatastetError, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Properties marking a dataset or a data repository: re3data repository ID,
/// Wikidata dataset imports page, Datahub page, data.gouv.fr dataset ID,
/// dataset distribution.
pub const DATASET_PROPERTIES: [&str; 5] = ["P5874", "P5195", "P2666", "P6526", "P2702"];

/// Official website property
pub const OFFICIAL_WEBSITE: &str = "P856";

/// Substrings of a lower-cased official website pointing to a data sharing platform
pub const REPOSITORY_MARKERS: [&str; 9] = [
    "datacite", "zenodo", "dryad", "figshare", "pangaea", "osf", "kaggle", "mendeley", "github",
];

/// Knowledge base statements of a linked entity, values grouped by property
pub type Statements = BTreeMap<String, Vec<String>>;

/// One rule of the filter cascade. A rule may clear the filter flag, never set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementRule {
    /// A dataset property is present
    DatasetProperty,
    /// The official website sits on a data sharing platform
    RepositoryWebsite,
    /// Nothing is known about the entity
    NoStatements,
}

impl StatementRule {
    pub const CASCADE: [StatementRule; 3] = [
        StatementRule::DatasetProperty,
        StatementRule::RepositoryWebsite,
        StatementRule::NoStatements,
    ];

    /// Whether the rule clears the filter flag for these statements.
    pub fn clears(&self, statements: Option<&Statements>) -> bool {
        match self {
            StatementRule::DatasetProperty => statements
                .is_some_and(|s| DATASET_PROPERTIES.iter().any(|p| s.contains_key(*p))),
            StatementRule::RepositoryWebsite => statements
                .and_then(|s| s.get(OFFICIAL_WEBSITE))
                .is_some_and(|sites| {
                    sites
                        .iter()
                        .map(|site| site.to_lowercase())
                        .any(|site| REPOSITORY_MARKERS.iter().any(|m| site.contains(m)))
                }),
            StatementRule::NoStatements => statements.is_none_or(|s| s.is_empty()),
        }
    }
}

/// Run the cascade from "keep".
pub fn should_filter(statements: Option<&Statements>) -> bool {
    let mut filtered = false;
    for rule in StatementRule::CASCADE {
        if filtered && rule.clears(statements) {
            filtered = false;
        }
    }
    filtered
}

/// A linked entity, as read from the service answer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkedEntity {
    /// Character offset of the mention in the query text
    pub offset_start: Option<usize>,
    pub confidence: Option<f64>,
    pub wikidata_id: Option<String>,
    pub wikipedia_external_ref: Option<i64>,
    /// `None` when the answer had no `statements` field
    pub statements: Option<Statements>,
}

impl LinkedEntity {
    fn from_json(entity: &Value) -> Self {
        let statements = entity["statements"].as_array().map(|list| {
            let mut statements = Statements::new();
            for statement in list {
                let Some(property) = statement["propertyId"].as_str() else {
                    continue;
                };
                let value = match &statement["value"] {
                    Value::Null => continue,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                statements.entry(property.to_string()).or_default().push(value);
            }
            statements
        });

        Self {
            offset_start: entity["offsetStart"].as_u64().map(|o| o as usize),
            confidence: entity["confidence_score"].as_f64(),
            wikidata_id: entity["wikidataId"].as_str().map(str::to_string),
            wikipedia_external_ref: entity["wikipediaExternalRef"].as_i64(),
            statements,
        }
    }
}

/// Read a disambiguation answer leniently: missing fields stay unset.
///
/// Returns the detected language and the linked entities.
pub fn parse_answer(answer: &Value) -> Result<(Option<String>, Vec<LinkedEntity>)> {
    if !answer.is_object() {
        return Err(DatastetError::MalformedResponse(
            "disambiguation answer is not a JSON object".to_string(),
        ));
    }
    let lang = answer["language"]["lang"].as_str().map(str::to_string);
    let entities = answer["entities"]
        .as_array()
        .map(|list| list.iter().map(LinkedEntity::from_json).collect())
        .unwrap_or_default();
    Ok((lang, entities))
}

const DISAMBIGUATED_TYPES: [ComponentType; 3] = [
    ComponentType::DatasetName,
    ComponentType::Dataset,
    ComponentType::DataDevice,
];

/// Links the name, dataset and device components of a document and applies
/// the statement filter
#[derive(Debug, Clone)]
pub struct DisambiguatorFilter {
    service: Arc<dyn Disambiguator>,
    lang: String,
    customisation: String,
    min_selector_score: f64,
}

impl DisambiguatorFilter {
    pub fn new(service: Arc<dyn Disambiguator>, config: &DisambiguationConfig) -> Self {
        Self {
            service,
            lang: config.lang.clone(),
            customisation: config.customisation.clone(),
            min_selector_score: config.min_selector_score,
        }
    }

    /// Build the document query. Entity offsets are character offsets in the
    /// document text.
    pub fn query(&self, document: &Document, records: &[Dataset]) -> DisambiguationQuery {
        let text = document.text();
        let mut query = DisambiguationQuery::new(text.clone(), self.lang.clone())
            .with_customisation(self.customisation.clone())
            .with_min_selector_score(self.min_selector_score);
        for component in records.iter().flat_map(|r| r.components()) {
            if !DISAMBIGUATED_TYPES.contains(&component.component_type) {
                continue;
            }
            query = query.with_entity(
                component.raw_form.clone(),
                byte_to_char(&text, component.offsets.global_start()),
                byte_to_char(&text, component.offsets.global_end()),
            );
        }
        query
    }

    /// Disambiguate all records in one request and apply the filter.
    ///
    /// Answers are matched to components by start offset. Returns the number
    /// of components enriched.
    pub async fn apply(&self, document: &Document, records: &mut [Dataset]) -> Result<usize> {
        let query = self.query(document, records);
        if query.entities.is_empty() {
            return Ok(0);
        }

        let answer = self.service.disambiguate(&query).await?;
        let (lang, entities) = parse_answer(&answer)?;

        let text = &query.text;
        let mut positions: HashMap<usize, Vec<(usize, ComponentType)>> = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            for component in record.components() {
                if DISAMBIGUATED_TYPES.contains(&component.component_type) {
                    positions
                        .entry(byte_to_char(text, component.offsets.global_start()))
                        .or_default()
                        .push((index, component.component_type));
                }
            }
        }

        let mut enriched = 0;
        for entity in &entities {
            let Some(targets) = entity.offset_start.and_then(|start| positions.get(&start)) else {
                continue;
            };
            let filtered = should_filter(entity.statements.as_ref());
            for &(index, component_type) in targets {
                let Some(component) = records[index]
                    .components_mut()
                    .find(|c| c.component_type == component_type)
                else {
                    continue;
                };
                if entity.wikidata_id.is_some() {
                    component.wikidata_id = entity.wikidata_id.clone();
                }
                if entity.wikipedia_external_ref.is_some() {
                    component.wikipedia_external_ref = entity.wikipedia_external_ref;
                }
                if entity.confidence.is_some() {
                    component.disambiguation_score = entity.confidence;
                }
                if lang.is_some() {
                    component.lang = lang.clone();
                }
                if filtered {
                    debug!(raw = %component.raw_form, "Filtered by knowledge base statements");
                    component.filtered = true;
                }
                enriched += 1;
            }
        }

        for record in records.iter_mut() {
            record.refresh_filtered();
        }
        info!(enriched, linked = entities.len(), service = self.service.name(), "Disambiguated components");
        Ok(enriched)
    }
}
