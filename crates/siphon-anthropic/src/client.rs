// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Provides [`AnthropicClient`] which handles request construction,
//! authentication, and transient error retry.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use siphon_core::SiphonError;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// Base URL for the Anthropic Messages API.
const API_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// HTTP client for Anthropic API communication.
///
/// Manages authentication headers, connection pooling, and retry logic
/// for transient errors (429, 500, 503, 529).
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    model: String,
    max_retries: u32,
    base_url: String,
}

impl AnthropicClient {
    /// Creates a new Anthropic API client.
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API key for authentication
    /// * `api_version` - API version string (e.g., "2023-06-01")
    /// * `model` - Model identifier used for every request
    /// * `timeout` - Whole-request timeout
    pub fn new(
        api_key: &str,
        api_version: &str,
        model: String,
        timeout: Duration,
    ) -> Result<Self, SiphonError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| SiphonError::Config(format!("invalid API key header value: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version).map_err(|e| {
                SiphonError::Config(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| SiphonError::Classifier {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            model,
            max_retries: 1,
            base_url: API_BASE_URL.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends a request and returns the full response.
    ///
    /// On transient errors, retries once after a 1-second delay.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, SiphonError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying classification request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .json(request)
                .send()
                .await
                .map_err(|e| SiphonError::Classifier {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "classification response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| SiphonError::Classifier {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| SiphonError::Classifier {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(SiphonError::Classifier {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Anthropic API error ({}): {}",
                    api_err.error.type_, api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(SiphonError::Classifier {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| SiphonError::Classifier {
            message: "classification request failed after retries".into(),
            source: None,
        }))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiMessage;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> AnthropicClient {
        AnthropicClient::new(
            "test-api-key",
            "2023-06-01",
            "claude-haiku-4-5".into(),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(base_url.to_string())
    }

    fn test_request() -> MessageRequest {
        MessageRequest {
            model: "claude-haiku-4-5".into(),
            messages: vec![ApiMessage::user("Hello")],
            system: None,
            max_tokens: 256,
            temperature: Some(0.0),
        }
    }

    fn ok_body(id: &str, text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "model": "claude-haiku-4-5",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        })
    }

    #[tokio::test]
    async fn complete_message_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("msg_test", "Hi")))
            .mount(&server)
            .await;

        let result = test_client(&server.uri())
            .complete_message(&test_request())
            .await
            .unwrap();
        assert_eq!(result.id, "msg_test");
        assert_eq!(result.text(), "Hi");
    }

    #[tokio::test]
    async fn complete_message_retries_on_429() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"type": "rate_limit_error", "message": "Rate limited"}
        });

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(429).set_body_json(&error_body))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("msg_retry", "ok")))
            .mount(&server)
            .await;

        let result = test_client(&server.uri())
            .complete_message(&test_request())
            .await
            .unwrap();
        assert_eq!(result.id, "msg_retry");
    }

    #[tokio::test]
    async fn complete_message_fails_on_400() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"type": "invalid_request_error", "message": "Bad model"}
        });
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(&error_body))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete_message(&test_request())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid_request_error"), "got: {err}");
    }

    #[tokio::test]
    async fn complete_message_exhausts_retries_on_503() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"type": "overloaded_error", "message": "Service overloaded"}
        });
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503).set_body_json(&error_body))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete_message(&test_request())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("overloaded_error"), "got: {err}");
    }

    #[tokio::test]
    async fn client_sends_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("x-api-key", "test-api-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("msg_h", "ok")))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server.uri())
            .complete_message(&test_request())
            .await
            .unwrap();
    }

    #[test]
    fn transient_statuses() {
        for code in [429u16, 500, 503, 529] {
            assert!(is_transient_error(reqwest::StatusCode::from_u16(code).unwrap()));
        }
        assert!(!is_transient_error(reqwest::StatusCode::BAD_REQUEST));
    }
}
