//! Spire GraphQL HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    config::SpireConfig,
    error::{GraphqlClientError, GraphqlError},
    query::GraphqlRequest,
    types::VesselsData,
};

/// Executes one vessels request against a GraphQL endpoint.
///
/// Implementations make exactly one exchange per call: no retry and no
/// pagination awareness. The page iterator owns both.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Send `request` and decode its `data` object.
    async fn run(&self, request: &GraphqlRequest) -> Result<VesselsData, GraphqlClientError>;
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<VesselsData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

/// reqwest-backed [`QueryClient`].
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    http: Client,
    endpoint: String,
}

impl GraphqlClient {
    /// Create a client for `endpoint` authenticating with `token`.
    pub fn new(
        endpoint: impl Into<String>,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, GraphqlClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            GraphqlClientError::Protocol {
                message: "token is not a valid header value".into(),
            }
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(format!("fcp-spire-ais/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Create a client from connector configuration.
    pub fn from_config(config: &SpireConfig) -> Result<Self, GraphqlClientError> {
        Self::new(config.api_url.as_str(), &config.token, config.timeout)
    }

    /// Endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryClient for GraphqlClient {
    #[instrument(skip(self, request), fields(first = request.variables.first, after = ?request.variables.after))]
    async fn run(&self, request: &GraphqlRequest) -> Result<VesselsData, GraphqlClientError> {
        let response = self.http.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(status = status.as_u16(), len = bytes.len(), "GraphQL response received");

        if !status.is_success() {
            return Err(GraphqlClientError::HttpStatus {
                status,
                body: truncate_body(&bytes),
            });
        }

        let response: GraphqlResponse = serde_json::from_slice(&bytes)?;
        if !response.errors.is_empty() {
            return Err(GraphqlClientError::GraphqlErrors {
                errors: response.errors,
            });
        }
        response.data.ok_or_else(|| GraphqlClientError::Protocol {
            message: "missing GraphQL data".to_string(),
        })
    }
}

fn truncate_body(bytes: &[u8]) -> String {
    const MAX_LEN: usize = 4096;
    let mut body = String::from_utf8_lossy(bytes).into_owned();
    if body.len() > MAX_LEN {
        let mut end = MAX_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push('…');
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::VESSEL_QUERY;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method},
    };

    fn client(server: &MockServer) -> GraphqlClient {
        GraphqlClient::new(server.uri(), "test-token", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_run_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_partial_json(serde_json::json!({
                "variables": {"first": 2, "after": "c0"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "vessels": {
                        "pageInfo": {"hasNextPage": true, "endCursor": "c1"},
                        "nodes": [
                            {"id": "v1", "updateTimestamp": "2021-10-01T15:00:00Z"},
                            {"id": "v2", "updateTimestamp": "2021-10-01T15:00:01Z"}
                        ]
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = GraphqlRequest::page(VESSEL_QUERY, 2, Some("c0".into()));
        let data = client(&server).run(&request).await.unwrap();

        assert_eq!(data.vessels.nodes.len(), 2);
        assert_eq!(data.vessels.nodes[1].id, "v2");
        assert_eq!(data.vessels.page_info.cursor(), Some("c1"));
    }

    #[tokio::test]
    async fn test_run_graphql_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": null,
                "errors": [{"message": "Cannot query field \"foo\""}]
            })))
            .mount(&server)
            .await;

        let request = GraphqlRequest::page("query { foo }", 1, None);
        let err = client(&server).run(&request).await.unwrap_err();

        assert!(matches!(err, GraphqlClientError::GraphqlErrors { ref errors } if errors.len() == 1));
        assert!(err.to_string().contains("Cannot query field"));
    }

    #[tokio::test]
    async fn test_run_http_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let request = GraphqlRequest::page(VESSEL_QUERY, 1, None);
        let err = client(&server).run(&request).await.unwrap_err();

        assert!(matches!(
            err,
            GraphqlClientError::HttpStatus { status, .. }
                if status == reqwest::StatusCode::UNAUTHORIZED
        ));
        assert!(err.to_string().contains("invalid token"));
    }

    #[tokio::test]
    async fn test_run_missing_data() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let request = GraphqlRequest::page(VESSEL_QUERY, 1, None);
        let err = client(&server).run(&request).await.unwrap_err();

        assert!(matches!(err, GraphqlClientError::Protocol { .. }));
    }

    #[tokio::test]
    async fn test_run_invalid_json() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let request = GraphqlRequest::page(VESSEL_QUERY, 1, None);
        let err = client(&server).run(&request).await.unwrap_err();

        assert!(matches!(err, GraphqlClientError::Json(_)));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(5000);
        let body = truncate_body(long.as_bytes());
        assert!(body.ends_with('…'));
        assert_eq!(body.chars().count(), 4097);

        assert_eq!(truncate_body(b"short"), "short");
    }
}
