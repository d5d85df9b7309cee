//! The gateway: one call = prompt + model + schema → tagged outcome.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{ApiErrorKind, SwageError};

use super::schema::SchemaSpec;
use super::transport::{LlmRequest, LlmTransport};

/// Outcome of one gateway call. Callers decide what a fallback or an API
/// error means for their step; the gateway never retries.
#[derive(Debug)]
pub enum LlmOutcome {
    /// The response parsed as JSON. `violations` is non-empty when schema
    /// validation found problems; the parsed value is still the verbatim
    /// model output.
    Parsed {
        value: Value,
        tokens_used: usize,
        raw: String,
        violations: Vec<String>,
    },
    /// No JSON could be extracted from the response body.
    ParseFallback {
        raw: String,
        reason: String,
        tokens_used: usize,
    },
    /// The transport failed.
    ApiError { kind: ApiErrorKind, detail: String },
}

impl LlmOutcome {
    /// Tokens consumed by this call (zero for API errors).
    pub fn tokens_used(&self) -> usize {
        match self {
            LlmOutcome::Parsed { tokens_used, .. } => *tokens_used,
            LlmOutcome::ParseFallback { tokens_used, .. } => *tokens_used,
            LlmOutcome::ApiError { .. } => 0,
        }
    }
}

/// Single entry point for every model call in the system.
#[derive(Clone)]
pub struct LlmGateway {
    transport: Arc<dyn LlmTransport>,
}

impl LlmGateway {
    pub fn new(transport: Arc<dyn LlmTransport>) -> Self {
        Self { transport }
    }

    /// Name of the underlying transport.
    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Execute one call and validate the response against `schema`.
    pub fn call(&self, request: &LlmRequest, schema: &SchemaSpec) -> LlmOutcome {
        let reply = match self.transport.complete(request) {
            Ok(reply) => reply,
            Err(SwageError::LlmApi { kind, detail }) => {
                return LlmOutcome::ApiError { kind, detail }
            }
            Err(other) => {
                return LlmOutcome::ApiError {
                    kind: ApiErrorKind::Transient,
                    detail: other.to_string(),
                }
            }
        };

        match extract_json(&reply.text) {
            Some(value) => {
                let violations = schema.validate(&value);
                LlmOutcome::Parsed {
                    value,
                    tokens_used: reply.tokens_used,
                    raw: reply.text,
                    violations,
                }
            }
            None => LlmOutcome::ParseFallback {
                reason: "no JSON object found in response".to_string(),
                raw: reply.text,
                tokens_used: reply.tokens_used,
            },
        }
    }
}

/// Layered JSON extraction: whole body, then the first ```json fence, then
/// a greedy `{…}` slice.
fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(fenced) = trimmed.split("```json").nth(1) {
        if let Some(body) = fenced.split("```").next() {
            if let Ok(value) = serde_json::from_str::<Value>(body.trim()) {
                return Some(value);
            }
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end > start {
        if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockTransport;
    use serde_json::json;

    fn gateway_with(script: MockTransport) -> LlmGateway {
        LlmGateway::new(Arc::new(script))
    }

    fn request() -> LlmRequest {
        LlmRequest::new("test-model", "system", "user")
    }

    #[test]
    fn test_whole_body_json() {
        let value = extract_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_fenced_json() {
        let text = "Here you go:\n```json\n{\"a\": 2}\n```\nDone.";
        assert_eq!(extract_json(text).unwrap()["a"], 2);
    }

    #[test]
    fn test_greedy_slice() {
        let text = "The estimate is {\"a\": 3} as requested.";
        assert_eq!(extract_json(text).unwrap()["a"], 3);
    }

    #[test]
    fn test_no_json_anywhere() {
        assert!(extract_json("I cannot answer that.").is_none());
    }

    #[test]
    fn test_gateway_parse_fallback() {
        let transport = MockTransport::new();
        transport.push_text("no json here at all");
        let gateway = gateway_with(transport);

        match gateway.call(&request(), &SchemaSpec::new()) {
            LlmOutcome::ParseFallback { raw, .. } => assert!(raw.contains("no json")),
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_gateway_flags_violations() {
        let transport = MockTransport::new();
        transport.push_json(json!({"material": "unobtanium"}));
        let gateway = gateway_with(transport);
        let schema = SchemaSpec::new().one_of("material", &["steel"]);

        match gateway.call(&request(), &schema) {
            LlmOutcome::Parsed { value, violations, .. } => {
                assert_eq!(value["material"], "unobtanium");
                assert_eq!(violations.len(), 1);
            }
            other => panic!("expected parsed, got {other:?}"),
        }
    }

    #[test]
    fn test_gateway_surfaces_api_error() {
        let transport = MockTransport::new();
        transport.push_failure(ApiErrorKind::Quota, "rate limited");
        let gateway = gateway_with(transport);

        match gateway.call(&request(), &SchemaSpec::new()) {
            LlmOutcome::ApiError { kind, detail } => {
                assert_eq!(kind, ApiErrorKind::Quota);
                assert!(detail.contains("rate limited"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
