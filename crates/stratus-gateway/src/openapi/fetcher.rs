//! Upstream API-description document fetching.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Why a cluster contributed no document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to '{url}' failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("'{url}' answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("'{url}' did not answer within {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("document at '{url}' is malformed: {reason}")]
    Malformed { url: String, reason: String },
}

/// The parts of an upstream document aggregation reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamDocument {
    /// Operation path → path-item.
    pub paths: Map<String, Value>,
    /// Schema name → schema body, from `components.schemas`.
    pub schemas: Map<String, Value>,
}

impl UpstreamDocument {
    /// Extract `paths` and `components.schemas` from a parsed document.
    ///
    /// `paths` is required; a missing `components.schemas` yields an empty
    /// schema catalog.
    pub fn from_value(document: Value) -> Result<Self, String> {
        let Value::Object(mut root) = document else {
            return Err("document root is not an object".to_string());
        };
        let paths = match root.remove("paths") {
            Some(Value::Object(paths)) => paths,
            Some(_) => return Err("'paths' is not an object".to_string()),
            None => return Err("'paths' is missing".to_string()),
        };
        let schemas = match root
            .get_mut("components")
            .and_then(|c| c.as_object_mut())
            .and_then(|c| c.remove("schemas"))
        {
            Some(Value::Object(schemas)) => schemas,
            Some(_) => return Err("'components.schemas' is not an object".to_string()),
            None => Map::new(),
        };
        Ok(Self { paths, schemas })
    }
}

/// Source of upstream documents, keyed by address.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, address: &str) -> Result<UpstreamDocument, FetchError>;
}

/// Plain HTTP `GET` with a per-fetch timeout.
pub struct HttpDocumentFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpDocumentFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    #[instrument(skip(self), fields(timeout_ms = self.timeout.as_millis() as u64))]
    async fn fetch(&self, address: &str) -> Result<UpstreamDocument, FetchError> {
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: address.to_string(),
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                }
            } else {
                FetchError::Network {
                    url: address.to_string(),
                    source: e,
                }
            }
        };

        let response = self
            .client
            .get(address)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: address.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(classify)?;
        debug!(bytes = body.len(), "upstream document received");

        let document: Value = serde_json::from_slice(&body).map_err(|e| FetchError::Malformed {
            url: address.to_string(),
            reason: e.to_string(),
        })?;
        UpstreamDocument::from_value(document).map_err(|reason| FetchError::Malformed {
            url: address.to_string(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn document_without_schemas_is_accepted() {
        let doc = UpstreamDocument::from_value(json!({"paths": {"/a": {}}})).unwrap();
        assert_eq!(doc.paths.len(), 1);
        assert!(doc.schemas.is_empty());
    }

    #[test]
    fn document_without_paths_is_malformed() {
        assert!(UpstreamDocument::from_value(json!({"components": {"schemas": {}}})).is_err());
        assert!(UpstreamDocument::from_value(json!([1, 2])).is_err());
    }

    #[tokio::test]
    async fn fetches_and_parses_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openapi.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "paths": {"/orders": {"get": {}}},
                "components": {"schemas": {"Order": {"type": "object"}}}
            })))
            .mount(&server)
            .await;

        let fetcher = HttpDocumentFetcher::new(Duration::from_secs(5));
        let doc = fetcher
            .fetch(&format!("{}/openapi.json", server.uri()))
            .await
            .unwrap();
        assert!(doc.paths.contains_key("/orders"));
        assert!(doc.schemas.contains_key("Order"));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpDocumentFetcher::new(Duration::from_secs(5));
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn invalid_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let fetcher = HttpDocumentFetcher::new(Duration::from_secs(5));
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"paths": {}}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let fetcher = HttpDocumentFetcher::new(Duration::from_millis(50));
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { timeout_ms: 50, .. }));
    }
}
