//! HTTP client for the text classification service.
//!
//! One service hosts the role models and the data type model. A batch is
//! posted as `{"texts": [...]}` to `{url}/service/classify/{model}`.

use super::{ContextClassifier, ContextModel, DatatypeClassifier, http_client, map_http_error, parse_json};
use crate::{DatastetError, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error};

/// Model name of the data type classifier
pub const DATATYPE_MODEL: &str = "dataseer";

/// Client for a classification service
///
/// # Example
///
/// ```no_run
/// use datastet::services::ClassifierClient;
/// use std::time::Duration;
///
/// let client = ClassifierClient::new("http://localhost:8060".to_string())
///     .with_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct ClassifierClient {
    /// Base URL of the service
    pub url: String,
    /// Request timeout duration
    pub timeout: Duration,
}

impl ClassifierClient {
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

    fn endpoint(&self, model: &str) -> String {
        format!("{}/service/classify/{}", self.url.trim_end_matches('/'), model)
    }

    async fn post(&self, model: &str, texts: &[String]) -> Result<Value> {
        let client = http_client("classifier", self.timeout)?;
        let endpoint = self.endpoint(model);
        debug!(model, count = texts.len(), "Sending classification batch");

        let response = client
            .post(&endpoint)
            .json(&json!({ "texts": texts }))
            .send()
            .await
            .map_err(|e| map_http_error("classifier", e))?;

        let status = response.status();
        if !status.is_success() {
            error!("Classification request failed (model: {}, status: {})", model, status);
            return Err(DatastetError::Service(format!(
                "classifier returned HTTP {} for model {}",
                status, model
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_http_error("classifier", e))?;
        parse_json("classifier", &body)
    }
}

#[async_trait]
impl ContextClassifier for ClassifierClient {
    fn name(&self) -> &str {
        "classifier"
    }

    async fn classify(&self, texts: &[String], model: ContextModel) -> Result<Value> {
        self.post(model.as_str(), texts).await
    }
}

#[async_trait]
impl DatatypeClassifier for ClassifierClient {
    fn name(&self) -> &str {
        "classifier"
    }

    async fn classify(&self, sentences: &[String]) -> Result<Value> {
        self.post(DATATYPE_MODEL, sentences).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let client = ClassifierClient::new("http://localhost:8060/".to_string());
        assert_eq!(
            client.endpoint(ContextModel::Shared.as_str()),
            "http://localhost:8060/service/classify/context_shared"
        );
        assert_eq!(client.endpoint(DATATYPE_MODEL), "http://localhost:8060/service/classify/dataseer");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_service_error() {
        let client = ClassifierClient::new("http://127.0.0.1:9".to_string())
            .with_timeout(Duration::from_millis(500));
        let result = ContextClassifier::classify(&client, &["text".to_string()], ContextModel::All).await;
        assert!(matches!(result, Err(DatastetError::Service(_))));
    }
}
