//! Anthropic Claude API transport.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiErrorKind, Result, SwageError};

use super::transport::{LlmReply, LlmRequest, LlmTransport};

/// Anthropic API endpoint.
const API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version.
const API_VERSION: &str = "2023-06-01";

/// Text completions get a 60 s budget per call.
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

/// Anthropic transport. Credential and client are set once at construction
/// and read-only afterwards.
pub struct AnthropicTransport {
    client: Client,
    api_key: String,
}

impl AnthropicTransport {
    /// Create a transport with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(COMPLETION_TIMEOUT)
            .build()
            .map_err(|e| SwageError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }

    /// Create from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            SwageError::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| SwageError::Config(format!("Invalid API key: {}", e)))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    /// Map HTTP status to the error taxonomy.
    fn classify_status(status: StatusCode) -> ApiErrorKind {
        match status.as_u16() {
            401 | 403 => ApiErrorKind::Auth,
            429 => ApiErrorKind::Quota,
            _ => ApiErrorKind::Transient,
        }
    }
}

impl LlmTransport for AnthropicTransport {
    fn complete(&self, request: &LlmRequest) -> Result<LlmReply> {
        let body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "system": request.system,
            "messages": [
                {
                    "role": "user",
                    "content": request.user
                }
            ]
        });

        let response = self
            .client
            .post(API_URL)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .map_err(|e| SwageError::LlmApi {
                kind: ApiErrorKind::Transient,
                detail: format!("request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(SwageError::LlmApi {
                kind: Self::classify_status(status),
                detail: format!("API error ({}): {}", status, error_text),
            });
        }

        let api_response: ApiResponse = response.json().map_err(|e| SwageError::LlmApi {
            kind: ApiErrorKind::Transient,
            detail: format!("failed to parse API response: {}", e),
        })?;

        let tokens_used = api_response
            .usage
            .map(|u| u.input_tokens + u.output_tokens)
            .unwrap_or(0);

        let text = api_response
            .content
            .into_iter()
            .find_map(|block| (block.content_type == "text").then_some(block.text))
            .ok_or_else(|| SwageError::LlmApi {
                kind: ApiErrorKind::Transient,
                detail: "no text in API response".to_string(),
            })?;

        Ok(LlmReply { text, tokens_used })
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

/// Anthropic API response structure.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

/// Content block in API response.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: usize,
    #[serde(default)]
    output_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            AnthropicTransport::classify_status(StatusCode::UNAUTHORIZED),
            ApiErrorKind::Auth
        );
        assert_eq!(
            AnthropicTransport::classify_status(StatusCode::FORBIDDEN),
            ApiErrorKind::Auth
        );
        assert_eq!(
            AnthropicTransport::classify_status(StatusCode::TOO_MANY_REQUESTS),
            ApiErrorKind::Quota
        );
        assert_eq!(
            AnthropicTransport::classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            ApiErrorKind::Transient
        );
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{
            "content": [{"type": "text", "text": "{\"a\": 1}"}],
            "usage": {"input_tokens": 100, "output_tokens": 20}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.content.len(), 1);
        assert_eq!(parsed.usage.unwrap().output_tokens, 20);
    }
}
