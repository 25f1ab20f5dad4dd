//! HTTP client for an entity-fishing disambiguation service.

use super::{Disambiguator, http_client, map_http_error, parse_json};
use crate::{DatastetError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Language block of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLanguage {
    pub lang: String,
}

/// A span to disambiguate, offsets in characters relative to the query text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEntity {
    pub raw_name: String,
    pub offset_start: usize,
    pub offset_end: usize,
}

/// Body of a disambiguation request
///
/// `mentions` is always empty so that only the given entities are processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisambiguationQuery {
    pub language: QueryLanguage,
    pub text: String,
    pub mentions: Vec<String>,
    pub entities: Vec<QueryEntity>,
    pub full: bool,
    pub customisation: String,
    pub min_selector_score: f64,
}

impl DisambiguationQuery {
    pub fn new(text: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            language: QueryLanguage { lang: lang.into() },
            text: text.into(),
            mentions: Vec::new(),
            entities: Vec::new(),
            full: true,
            customisation: "dataset".to_string(),
            min_selector_score: 0.2,
        }
    }

    pub fn with_customisation(mut self, customisation: impl Into<String>) -> Self {
        self.customisation = customisation.into();
        self
    }

    pub fn with_min_selector_score(mut self, score: f64) -> Self {
        self.min_selector_score = score;
        self
    }

    pub fn with_entity(mut self, raw_name: impl Into<String>, offset_start: usize, offset_end: usize) -> Self {
        self.entities.push(QueryEntity {
            raw_name: raw_name.into(),
            offset_start,
            offset_end,
        });
        self
    }
}

/// Client for entity-fishing
///
/// # Example
///
/// ```no_run
/// use datastet::services::EntityFishingClient;
///
/// let client = EntityFishingClient::new("http://localhost:8090".to_string());
/// ```
#[derive(Debug, Clone)]
pub struct EntityFishingClient {
    /// Base URL of the service
    pub url: String,
    /// Request timeout duration
    pub timeout: Duration,
}

impl EntityFishingClient {
    pub fn new(url: String) -> Self {
        Self {
            url,
            timeout: Duration::from_secs(60),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/service/{}", self.url.trim_end_matches('/'), path)
    }

    /// Whether the named customisation is installed on the server.
    pub async fn has_customisation(&self, name: &str) -> Result<bool> {
        let client = http_client("entity-fishing", self.timeout)?;
        let response = client
            .get(self.endpoint(&format!("customisation/{}", name)))
            .send()
            .await
            .map_err(|e| map_http_error("entity-fishing", e))?;

        let present = response.status().is_success();
        if !present {
            warn!(
                "Customisation {} not available on entity-fishing (status: {})",
                name,
                response.status()
            );
        }
        Ok(present)
    }
}

#[async_trait]
impl Disambiguator for EntityFishingClient {
    fn name(&self) -> &str {
        "entity-fishing"
    }

    async fn is_alive(&self) -> Result<bool> {
        let client = http_client("entity-fishing", self.timeout)?;
        let response = client
            .get(self.endpoint("isalive"))
            .send()
            .await
            .map_err(|e| map_http_error("entity-fishing", e))?;

        let status = response.status();
        if !status.is_success() {
            error!("entity-fishing isalive check failed (status: {})", status);
            return Ok(false);
        }
        let body = response
            .text()
            .await
            .map_err(|e| map_http_error("entity-fishing", e))?;
        let alive = body.trim().parse::<bool>().unwrap_or(true);
        info!(alive, url = %self.url, "entity-fishing status");
        Ok(alive)
    }

    async fn disambiguate(&self, query: &DisambiguationQuery) -> Result<Value> {
        let client = http_client("entity-fishing", self.timeout)?;
        let payload = serde_json::to_string(query)
            .map_err(|e| DatastetError::Other(format!("Failed to serialize query: {}", e)))?;
        debug!(entities = query.entities.len(), "Sending disambiguation query");

        let form = reqwest::multipart::Form::new().text("query", payload);
        let response = client
            .post(self.endpoint("disambiguate"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| map_http_error("entity-fishing", e))?;

        let status = response.status();
        if !status.is_success() {
            error!("Disambiguation request failed (status: {})", status);
            return Err(DatastetError::Service(format!(
                "entity-fishing returned HTTP {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_http_error("entity-fishing", e))?;
        parse_json("entity-fishing", &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_layout() {
        let query = DisambiguationQuery::new("The GSE1 data", "en").with_entity("GSE1", 4, 8);
        let value = serde_json::to_value(&query).unwrap();

        assert_eq!(value["language"]["lang"], "en");
        assert_eq!(value["mentions"], serde_json::json!([]));
        assert_eq!(value["entities"][0]["rawName"], "GSE1");
        assert_eq!(value["entities"][0]["offsetStart"], 4);
        assert_eq!(value["entities"][0]["offsetEnd"], 8);
        assert_eq!(value["full"], true);
        assert_eq!(value["customisation"], "dataset");
        assert_eq!(value["minSelectorScore"], 0.2);
    }

    #[test]
    fn test_endpoints() {
        let client = EntityFishingClient::new("http://localhost:8090".to_string());
        assert_eq!(client.endpoint("isalive"), "http://localhost:8090/service/isalive");
        assert_eq!(
            client.endpoint("customisation/dataset"),
            "http://localhost:8090/service/customisation/dataset"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let client = EntityFishingClient::new("http://127.0.0.1:9".to_string())
            .with_timeout(Duration::from_millis(500));
        assert!(matches!(client.is_alive().await, Err(DatastetError::Service(_))));
    }
}
