//! HTTP client for a bibliographic lookup service.
//!
//! Each item is looked up with `GET {url}/service/lookup`, by DOI when the
//! item has one and by its raw reference string otherwise. The answer is read
//! leniently: Crossref-style fields (`title` as an array, `DOI`, `author`
//! with `given`/`family`, `issued.date-parts`) and flat fields are accepted.

use super::{CitationConsolidator, http_client, map_http_error, parse_json};
use crate::model::BiblioItem;
use crate::{DatastetError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Client for a biblio-glutton style lookup service
///
/// # Example
///
/// ```no_run
/// use datastet::services::BiblioLookupClient;
///
/// let client = BiblioLookupClient::new("http://localhost:8080".to_string());
/// ```
#[derive(Debug, Clone)]
pub struct BiblioLookupClient {
    /// Base URL of the service
    pub url: String,
    /// Request timeout duration
    pub timeout: Duration,
}

impl BiblioLookupClient {
    pub fn new(url: String) -> Self {
        Self {
            url,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn lookup_params(item: &BiblioItem) -> Option<(&'static str, String)> {
        if let Some(doi) = item.doi.as_ref().filter(|d| !d.trim().is_empty()) {
            return Some(("doi", doi.trim().to_string()));
        }
        if let Some(raw) = item.raw.as_ref().filter(|r| !r.trim().is_empty()) {
            return Some(("biblio", raw.trim().to_string()));
        }
        item.title
            .as_ref()
            .filter(|t| !t.trim().is_empty())
            .map(|title| ("atitle", title.trim().to_string()))
    }

    async fn lookup(&self, client: &reqwest::Client, item: &BiblioItem) -> Result<Option<BiblioItem>> {
        let Some((key, value)) = Self::lookup_params(item) else {
            return Ok(None);
        };
        let endpoint = format!("{}/service/lookup", self.url.trim_end_matches('/'));
        let response = client
            .get(&endpoint)
            .query(&[(key, value.as_str())])
            .send()
            .await
            .map_err(|e| map_http_error("biblio lookup", e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(DatastetError::Service(format!(
                "biblio lookup returned HTTP {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_http_error("biblio lookup", e))?;
        Ok(Some(read_item(&parse_json("biblio lookup", &body)?)))
    }
}

#[async_trait]
impl CitationConsolidator for BiblioLookupClient {
    fn name(&self) -> &str {
        "biblio-lookup"
    }

    async fn consolidate(&self, items: &[BiblioItem]) -> Result<Vec<Option<BiblioItem>>> {
        let client = http_client("biblio lookup", self.timeout)?;
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            results.push(self.lookup(&client, item).await?);
        }
        debug!(
            found = results.iter().filter(|r| r.is_some()).count(),
            total = items.len(),
            "Consolidated citations"
        );
        Ok(results)
    }
}

/// Read a lookup answer into an item, ignoring what does not fit.
pub fn read_item(value: &Value) -> BiblioItem {
    let text = |v: &Value| -> Option<String> {
        match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Array(values) => values.iter().find_map(|v| v.as_str()).map(str::to_string),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    };

    let title = text(&value["title"]);
    let doi = text(&value["DOI"]).or_else(|| text(&value["doi"]));

    let year = value["issued"]["date-parts"][0][0]
        .as_i64()
        .map(|y| y.to_string())
        .or_else(|| text(&value["year"]));

    let mut authors = Vec::new();
    if let Some(list) = value["author"].as_array() {
        for author in list {
            let name = [author["given"].as_str(), author["family"].as_str()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            if !name.is_empty() {
                authors.push(name);
            }
        }
    } else if let Some(list) = value["authors"].as_array() {
        authors.extend(list.iter().filter_map(|a| a.as_str()).map(str::to_string));
    }

    BiblioItem {
        title,
        authors,
        doi,
        year,
        raw: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_crossref_answer() {
        let item = read_item(&json!({
            "title": ["A dataset of things"],
            "DOI": "10.5281/zenodo.123",
            "author": [{"given": "Ada", "family": "Lovelace"}, {"family": "Turing"}],
            "issued": {"date-parts": [[2021, 4, 1]]}
        }));

        assert_eq!(item.title.as_deref(), Some("A dataset of things"));
        assert_eq!(item.doi.as_deref(), Some("10.5281/zenodo.123"));
        assert_eq!(item.year.as_deref(), Some("2021"));
        assert_eq!(item.authors, vec!["Ada Lovelace", "Turing"]);
    }

    #[test]
    fn test_read_flat_answer() {
        let item = read_item(&json!({"title": "Flat", "doi": "10.1/x", "year": 1999, "authors": ["X"]}));
        assert_eq!(item.title.as_deref(), Some("Flat"));
        assert_eq!(item.year.as_deref(), Some("1999"));
        assert_eq!(item.authors, vec!["X"]);
    }

    #[test]
    fn test_lookup_prefers_doi() {
        let item = BiblioItem {
            doi: Some("10.1/x".to_string()),
            raw: Some("Smith 2020".to_string()),
            ..Default::default()
        };
        assert_eq!(
            BiblioLookupClient::lookup_params(&item),
            Some(("doi", "10.1/x".to_string()))
        );
        assert_eq!(BiblioLookupClient::lookup_params(&BiblioItem::default()), None);
    }
}
