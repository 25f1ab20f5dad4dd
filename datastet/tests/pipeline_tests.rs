//! End-to-end tests of the document pipeline with in-memory services.

use async_trait::async_trait;
use datastet::config::ClassifierMode;
use datastet::model::{AnnotationType, BiblioItem, BoundingBox, PdfAnnotation, RoleDecision};
use datastet::output::document_json;
use datastet::prelude::*;
use datastet::services::{ContextModel, DisambiguationQuery};
use datastet::tokenizer::tokenize;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

/// Labels for the non-blank tokens of `text`: tokens listed in `names` are
/// dataset names, tokens listed in `implicit` implicit datasets.
fn labels(text: &str, names: &[&str], implicit: &[&str]) -> Vec<String> {
    tokenize(text, 0)
        .into_iter()
        .filter(|token| !token.text.trim().is_empty())
        .map(|token| {
            if names.contains(&token.text.as_str()) {
                "<dataset-name>".to_string()
            } else if implicit.contains(&token.text.as_str()) {
                "<dataset>".to_string()
            } else {
                "<other>".to_string()
            }
        })
        .collect()
}

fn labelled(text: &str, names: &[&str]) -> DocumentSequence {
    DocumentSequence::new(text).with_labels(labels(text, names, &[]))
}

fn offline_config() -> DatastetConfig {
    ConfigBuilder::testing().build().expect("Failed to build config")
}

fn processor() -> DocumentProcessorBuilder {
    DocumentProcessor::builder()
        .with_config(offline_config())
        .with_tagger(Arc::new(FixedTagger::new()))
}

#[derive(Debug)]
struct ScriptedContextClassifier {
    answer: std::result::Result<Value, String>,
    models: Mutex<Vec<ContextModel>>,
}

impl ScriptedContextClassifier {
    fn answering(answer: Value) -> Self {
        Self {
            answer: Ok(answer),
            models: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            models: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContextClassifier for ScriptedContextClassifier {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn classify(&self, _texts: &[String], model: ContextModel) -> Result<Value> {
        self.models.lock().unwrap().push(model);
        self.answer.clone().map_err(DatastetError::Service)
    }
}

#[derive(Debug)]
struct ScriptedDatatypeClassifier(Value);

#[async_trait]
impl DatatypeClassifier for ScriptedDatatypeClassifier {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn classify(&self, _sentences: &[String]) -> Result<Value> {
        Ok(self.0.clone())
    }
}

#[derive(Debug)]
struct ScriptedDisambiguator {
    answer: Value,
    queries: Mutex<Vec<DisambiguationQuery>>,
}

impl ScriptedDisambiguator {
    fn new(answer: Value) -> Self {
        Self {
            answer,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Disambiguator for ScriptedDisambiguator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn is_alive(&self) -> Result<bool> {
        Ok(true)
    }

    async fn disambiguate(&self, query: &DisambiguationQuery) -> Result<Value> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.answer.clone())
    }
}

#[derive(Debug)]
struct TitleConsolidator;

#[async_trait]
impl CitationConsolidator for TitleConsolidator {
    fn name(&self) -> &str {
        "titles"
    }

    async fn consolidate(&self, items: &[BiblioItem]) -> Result<Vec<Option<BiblioItem>>> {
        Ok(items
            .iter()
            .map(|item| {
                item.raw.as_ref().map(|raw| BiblioItem {
                    title: Some(format!("Consolidated {}", raw)),
                    year: Some("2013".to_string()),
                    ..Default::default()
                })
            })
            .collect())
    }
}

#[tokio::test]
async fn test_named_dataset_with_url() {
    let text = "The GSE12345 dataset is available at https://osf.io/abc123.";
    let tagger = FixedTagger::with_blocks(vec![labels(text, &["GSE12345"], &[])]);
    let processor = DocumentProcessor::builder()
        .with_config(offline_config())
        .with_tagger(Arc::new(tagger))
        .build()
        .unwrap();

    let processed = processor
        .process(Document::new(vec![DocumentSequence::new(text)]))
        .await
        .unwrap();

    assert_eq!(processed.records.len(), 1);
    let record = &processed.records[0];
    assert_eq!(record.dataset_name.as_ref().unwrap().raw_form, "GSE12345");
    assert_eq!(record.url.as_ref().unwrap().raw_form, "https://osf.io/abc123");
    assert_eq!(record.context.as_deref(), Some(text));
    assert!(!record.propagated);
}

fn chars_before(text: &str, needle: &str) -> usize {
    text[..text.find(needle).unwrap()].chars().count()
}

#[tokio::test]
async fn test_output_offsets_are_characters() {
    let first = "Gr\u{f6}\u{df}e der Kohorte: 120 Teilnehmer. ";
    let second = "\u{dc}ber GSE1 wurde \u{e9}tudi\u{e9} at https://osf.io/abc123.";
    let document = Document::new(vec![
        DocumentSequence::new(first),
        labelled(second, &["GSE1"]),
    ]);

    let processed = processor().build().unwrap().process(document).await.unwrap();
    let value = document_json(&processed);
    let mention = &value["mentions"][0];

    assert_eq!(mention["rawForm"], "GSE1");
    assert_eq!(mention["contextOffset"], first.chars().count());
    assert_eq!(mention["dataset-name"]["offsetStart"], 5);
    assert_eq!(mention["dataset-name"]["offsetEnd"], 9);
    assert_eq!(mention["url"]["rawForm"], "https://osf.io/abc123");
    assert_eq!(mention["url"]["offsetStart"], chars_before(second, "https"));
    assert_eq!(
        mention["url"]["offsetEnd"],
        chars_before(second, "https") + "https://osf.io/abc123".len()
    );
}

#[tokio::test]
async fn test_url_extended_by_link_annotation() {
    let text = "Die Gr\u{f6}\u{df}e: GSE1 liegt unter https://zenodo.org/rec\nord/12345 bereit.";
    let link_box = BoundingBox {
        page: 1,
        x: 10.0,
        y: 10.0,
        width: 80.0,
        height: 12.0,
    };
    let mut sequence = labelled(text, &["GSE1"]);
    sequence.tokens = tokenize(text, 0);
    for token in sequence.tokens.iter_mut().filter(|t| t.text == "rec") {
        token.bounding_box = Some(link_box);
    }
    let document = Document::new(vec![sequence]).with_annotation(PdfAnnotation {
        annotation_type: AnnotationType::Uri,
        destination: "https://zenodo.org/record/12345".to_string(),
        boxes: vec![link_box],
    });

    let processed = processor().build().unwrap().process(document).await.unwrap();

    assert_eq!(processed.records.len(), 1);
    let url = processed.records[0].url.as_ref().unwrap();
    assert_eq!(url.raw_form, "https://zenodo.org/rec\nord/12345");
    assert_eq!(url.normalized_form, "https://zenodo.org/record/12345");

    let value = document_json(&processed);
    assert_eq!(value["mentions"][0]["url"]["offsetStart"], chars_before(text, "https"));
    assert_eq!(value["mentions"][0]["url"]["url"], "https://zenodo.org/record/12345");
}

fn repeated_accession() -> Document {
    Document::new(vec![
        labelled("ERP012345 was deposited. ", &["ERP012345"]),
        DocumentSequence::new("We reused ERP012345 here. "),
        DocumentSequence::new("ERP012345 again."),
    ])
}

#[tokio::test]
async fn test_propagation_above_threshold() {
    // tf 3, idf 0.0005: tf-idf 0.0015
    let lexicon = Lexicon::builtin().with_idf("ERP012345", 0.0005);
    let processor = processor().with_lexicon(Arc::new(lexicon)).build().unwrap();

    let processed = processor.process(repeated_accession()).await.unwrap();

    assert_eq!(processed.records.len(), 3);
    assert!(!processed.records[0].propagated);
    assert!(processed.records[1].propagated);
    assert!(processed.records[2].propagated);
    assert_eq!(processed.records[1].context.as_deref(), Some("We reused ERP012345 here. "));
    assert_eq!(processed.records[1].conf, 0.5);
}

#[tokio::test]
async fn test_propagation_below_threshold() {
    // tf 3, idf 0.0001: tf-idf 0.0003
    let lexicon = Lexicon::builtin().with_idf("ERP012345", 0.0001);
    let processor = processor().with_lexicon(Arc::new(lexicon)).build().unwrap();

    let processed = processor.process(repeated_accession()).await.unwrap();

    assert_eq!(processed.records.len(), 1);
    assert!(!processed.records[0].propagated);
}

fn three_mentions() -> Document {
    Document::new(vec![
        labelled("GSE1 was used. ", &["GSE1"]),
        labelled("GSE1 was reanalysed. ", &["GSE1"]),
        labelled("GSE1 is public.", &["GSE1"]),
    ])
}

#[tokio::test]
async fn test_context_aggregation_takes_max() {
    let mut config = offline_config();
    config.context.mode = ClassifierMode::MultiLabel;
    let classifier = Arc::new(ScriptedContextClassifier::answering(json!({"classifications": [
        {"used": 0.2, "creation": 0.1, "shared": 0.0},
        {"used": 0.9, "creation": 0.3, "shared": 0.1},
        {"used": 0.4, "creation": 0.2, "shared": 0.6}
    ]})));
    let processor = processor()
        .with_config(config)
        .with_context_classifier(classifier.clone())
        .build()
        .unwrap();

    let processed = processor.process(three_mentions()).await.unwrap();

    assert_eq!(*classifier.models.lock().unwrap(), vec![ContextModel::All]);
    assert_eq!(processed.records.len(), 3);
    let first = processed.records[0].mention_context_attributes.unwrap();
    assert_eq!(first.used, RoleDecision::new(false, 0.2));
    for record in &processed.records {
        let document = record.document_context_attributes.unwrap();
        assert_eq!(document.used, RoleDecision::new(true, 0.9));
        assert_eq!(document.created, RoleDecision::new(false, 0.3));
        assert_eq!(document.shared, RoleDecision::new(true, 0.6));
    }
}

#[tokio::test]
async fn test_binary_context_mode_queries_three_models() {
    let classifier = Arc::new(ScriptedContextClassifier::answering(json!({"classifications": [
        {"used": 0.8, "not_used": 0.2, "creation": 0.1, "not_creation": 0.9, "shared": 0.1, "not_shared": 0.9},
        {"used": 0.8, "not_used": 0.2, "creation": 0.1, "not_creation": 0.9, "shared": 0.1, "not_shared": 0.9},
        {"used": 0.8, "not_used": 0.2, "creation": 0.1, "not_creation": 0.9, "shared": 0.1, "not_shared": 0.9}
    ]})));
    let processor = processor()
        .with_context_classifier(classifier.clone())
        .build()
        .unwrap();

    let processed = processor.process(three_mentions()).await.unwrap();

    assert_eq!(
        *classifier.models.lock().unwrap(),
        vec![ContextModel::Used, ContextModel::Creation, ContextModel::Shared]
    );
    let document = processed.records[0].document_context_attributes.unwrap();
    assert_eq!(document.used, RoleDecision::new(true, 0.8));
    assert_eq!(document.created.value, Some(false));
}

#[tokio::test]
async fn test_unreachable_classifier_degrades() {
    let processor = processor()
        .with_context_classifier(Arc::new(ScriptedContextClassifier::failing("connection refused")))
        .build()
        .unwrap();

    let processed = processor.process(three_mentions()).await.unwrap();

    assert_eq!(processed.records.len(), 3);
    assert!(processed.records.iter().all(|r| r.mention_context_attributes.is_none()));
    assert!(processed.records.iter().all(|r| r.document_context_attributes.is_none()));
}

#[tokio::test]
async fn test_disambiguation_without_statements_keeps_mention() {
    let disambiguator = Arc::new(ScriptedDisambiguator::new(json!({
        "language": {"lang": "en"},
        "entities": [
            {"rawName": "GSE1", "offsetStart": 15, "offsetEnd": 19, "wikidataId": "Q1234", "confidence_score": 0.4}
        ]
    })));
    let processor = processor()
        .with_disambiguator(disambiguator.clone())
        .build()
        .unwrap();

    let processed = processor.process(three_mentions()).await.unwrap();

    assert_eq!(processed.records.len(), 3);
    assert!(processed.records.iter().all(|r| !r.filtered));
    let linked = processed.records[1].dataset_name.as_ref().unwrap();
    assert_eq!(linked.wikidata_id.as_deref(), Some("Q1234"));
    assert!(processed.records[0].dataset_name.as_ref().unwrap().wikidata_id.is_none());

    let queries = disambiguator.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    let starts: Vec<_> = queries[0].entities.iter().map(|e| e.offset_start).collect();
    assert_eq!(starts, vec![0, 15, 36]);
}

#[tokio::test]
async fn test_malformed_disambiguation_keeps_mentions() {
    let processor = processor()
        .with_disambiguator(Arc::new(ScriptedDisambiguator::new(json!(["not", "an", "object"]))))
        .build()
        .unwrap();

    let processed = processor.process(three_mentions()).await.unwrap();
    assert_eq!(processed.records.len(), 3);
}

#[tokio::test]
async fn test_citation_window_and_consolidation() {
    let text = "Data [0] from GSE1 [1] [2] were used; see also [3].";
    let item = |raw: &str| BiblioItem {
        raw: Some(raw.to_string()),
        ..Default::default()
    };
    let document = Document::new(vec![labelled(text, &["GSE1"])])
        .with_citation(BiblioComponent::new("b0", "[0]", 5, 8).with_item(item("Ref zero")))
        .with_citation(BiblioComponent::new("b1", "[1]", 19, 22).with_item(item("Ref one")))
        .with_citation(BiblioComponent::new("b2", "[2]", 23, 26).with_item(item("Ref two")))
        .with_citation(BiblioComponent::new("b3", "[3]", 47, 50).with_item(item("Ref three")));
    let processor = processor()
        .with_consolidator(Arc::new(TitleConsolidator))
        .build()
        .unwrap();

    let processed = processor.process(document).await.unwrap();

    let record = &processed.records[0];
    let keys: Vec<_> = record.citations.iter().map(|c| c.ref_key.as_str()).collect();
    assert_eq!(keys, vec!["b1", "b2"]);
    let name_end = record.dataset_name.as_ref().unwrap().offsets.global_end();
    assert!(record.citations.iter().all(|c| c.offsets.global_start() >= name_end));

    assert_eq!(processed.citations.len(), 2);
    let title = processed.citations[0].item.as_ref().unwrap().title.as_deref();
    assert_eq!(title, Some("Consolidated Ref one"));
}

#[tokio::test]
async fn test_citations_propagate_to_other_mentions() {
    let document = Document::new(vec![
        labelled("GSE1 [1] was used. ", &["GSE1"]),
        labelled("Later GSE1 was reanalysed.", &["GSE1"]),
    ])
    .with_citation(BiblioComponent::new("b1", "[1]", 5, 8));
    let processor = processor().build().unwrap();

    let processed = processor.process(document).await.unwrap();

    assert_eq!(processed.records.len(), 2);
    assert_eq!(processed.records[1].citations.len(), 1);
    assert_eq!(processed.records[1].citations[0].ref_key, "b1");
}

fn implicit_dataset() -> Document {
    let text = "We collected sequencing data.";
    Document::new(vec![
        DocumentSequence::new(text).with_labels(labels(text, &[], &["sequencing", "data"])),
    ])
}

#[tokio::test]
async fn test_low_has_dataset_score_is_gated() {
    let processor = processor()
        .with_datatype_classifier(Arc::new(ScriptedDatatypeClassifier(json!({
            "classifications": [{"has_dataset": 0.3, "no_dataset": 0.7, "Sequencing data": 0.8}]
        }))))
        .build()
        .unwrap();

    let processed = processor.process(implicit_dataset()).await.unwrap();
    assert!(processed.records.is_empty());
}

#[tokio::test]
async fn test_data_type_assigned() {
    let processor = processor()
        .with_datatype_classifier(Arc::new(ScriptedDatatypeClassifier(json!({
            "classifications": [{"has_dataset": 0.9, "no_dataset": 0.1, "Sequencing data": 0.8}]
        }))))
        .build()
        .unwrap();

    let processed = processor.process(implicit_dataset()).await.unwrap();

    assert_eq!(processed.records.len(), 1);
    let dataset = processed.records[0].dataset.as_ref().unwrap();
    assert_eq!(dataset.raw_form, "sequencing data");
    assert_eq!(dataset.best_data_type.as_deref(), Some("Sequencing data"));
}

#[tokio::test]
async fn test_malformed_data_type_answer_keeps_records() {
    let processor = processor()
        .with_datatype_classifier(Arc::new(ScriptedDatatypeClassifier(json!({"oops": true}))))
        .build()
        .unwrap();

    let processed = processor.process(implicit_dataset()).await.unwrap();

    assert_eq!(processed.records.len(), 1);
    assert!(processed.records[0].dataset.as_ref().unwrap().best_data_type.is_none());
}

#[tokio::test]
async fn test_availability_section() {
    let mut availability = labelled("GSE1 is deposited at GEO.", &["GSE1"]);
    availability.in_availability_section = true;
    let document = Document::new(vec![labelled("We used GSE1. ", &["GSE1"]), availability]);

    let processed = processor().build().unwrap().process(document).await.unwrap();

    assert_eq!(processed.records.len(), 2);
    assert!(!processed.records[0].in_data_availability_section);
    assert!(processed.records[1].in_data_availability_section);
}

#[tokio::test]
async fn test_mismatched_tokens_are_rejected() {
    let mut sequence = DocumentSequence::new("GSE1 data");
    sequence.tokens = tokenize("GSE2 data", 0);

    let result = processor().build().unwrap().process(Document::new(vec![sequence])).await;
    assert!(matches!(result, Err(DatastetError::InvalidDocument(_))));
}
