//! HTTP transport for the RAG query endpoint
//!
//! Sends `{"query", "top_k"}` as JSON and maps the reply onto
//! `RagResult` or one of the `Http` / `MalformedResponse` / `Transport`
//! errors.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use ragprobe_core::{EndpointConfig, Query, RagProbeError, RagResult, RagTransport, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    top_k: u8,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// reqwest-backed transport posting to a fixed URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    /// Create a transport with the client's default settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Create from config
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| RagProbeError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RagTransport for HttpTransport {
    async fn query(&self, query: &Query) -> Result<RagResult> {
        let request = QueryRequest {
            query: query.text(),
            top_k: query.top_k().get(),
        };
        tracing::debug!(url = %self.url, top_k = request.top_k, "POST query");

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| RagProbeError::Transport(describe_error(&e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RagProbeError::Transport(describe_error(&e)))?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "response received");

        if !status.is_success() {
            return Err(RagProbeError::Http {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        parse_result(&body)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Parse a 2xx body; anything without a string `answer` is malformed
fn parse_result(body: &[u8]) -> Result<RagResult> {
    serde_json::from_slice(body).map_err(|e| RagProbeError::MalformedResponse(e.to_string()))
}

/// Pull a non-empty string `detail` out of an error body
fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(detail) if !detail.trim().is_empty() => Some(detail),
        _ => None,
    }
}

/// Flatten an error and its sources into one line
fn describe_error(err: &(dyn std::error::Error + 'static)) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !description.contains(&text) {
            description.push_str(": ");
            description.push_str(&text);
        }
        source = cause.source();
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragprobe_core::TopK;

    #[test]
    fn test_request_body_shape() {
        let query = Query::new("What is RAG?", TopK::new(4)).unwrap();
        let request = QueryRequest {
            query: query.text(),
            top_k: query.top_k().get(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"query": "What is RAG?", "top_k": 4}));
    }

    #[test]
    fn test_parse_result() {
        let result = parse_result(br#"{"answer":"A","contexts":["c1","c2"]}"#).unwrap();
        assert_eq!(result.answer, "A");
        assert_eq!(result.contexts, vec!["c1", "c2"]);
    }

    #[test]
    fn test_parse_result_malformed() {
        let bodies: [&[u8]; 5] = [b"{}", b"not json", b"", br#"{"answer": 7}"#, b"[]"];
        for body in bodies {
            let err = parse_result(body).unwrap_err();
            assert!(matches!(err, RagProbeError::MalformedResponse(_)));
            assert_eq!(err.failure_message(), "malformed response");
        }
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(br#"{"detail":"service unavailable"}"#).as_deref(),
            Some("service unavailable")
        );
        assert_eq!(error_detail(br#"{"error":"nope"}"#), None);
        assert_eq!(error_detail(br#"{"detail":""}"#), None);
        assert_eq!(error_detail(br#"{"detail":[{"msg":"field required"}]}"#), None);
        assert_eq!(error_detail(b"<html>502</html>"), None);
    }

    #[derive(Debug)]
    struct SendError(std::io::Error);

    impl std::fmt::Display for SendError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl std::error::Error for SendError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_describe_error_chain() {
        let err = SendError(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(
            describe_error(&err),
            "error sending request: connection refused"
        );
    }

    #[test]
    fn test_from_config() {
        let config = EndpointConfig {
            url: "http://rag.local/query".to_string(),
            timeout_secs: Some(5),
        };
        let transport = HttpTransport::from_config(&config).unwrap();
        assert_eq!(transport.url(), "http://rag.local/query");
        assert_eq!(transport.name(), "http");
    }
}
