//! Scripted transport for tests.
//!
//! Replies are consumed in push order, one per call, which mirrors the fixed
//! call sequence of an estimate (material, competency, route, costing,
//! rating, negotiation). An exhausted script fails as a transient API error
//! so tests notice missing fixtures instead of hanging on defaults silently.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use crate::error::{ApiErrorKind, Result, SwageError};

use super::transport::{LlmReply, LlmRequest, LlmTransport};

enum ScriptedReply {
    Text(String),
    Fail(ApiErrorKind, String),
}

/// Mock transport that plays back a scripted sequence of replies.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw text reply.
    pub fn push_text(&self, text: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(ScriptedReply::Text(text.into()));
        }
    }

    /// Queue a JSON reply.
    pub fn push_json(&self, value: Value) {
        self.push_text(value.to_string());
    }

    /// Queue a transport failure.
    pub fn push_failure(&self, kind: ApiErrorKind, detail: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(ScriptedReply::Fail(kind, detail.into()));
        }
    }

    /// Requests seen so far, in call order.
    pub fn requests_seen(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of calls made against this transport.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl LlmTransport for MockTransport {
    fn complete(&self, request: &LlmRequest) -> Result<LlmReply> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(ScriptedReply::Text(text)) => Ok(LlmReply {
                tokens_used: text.len() / 4,
                text,
            }),
            Some(ScriptedReply::Fail(kind, detail)) => Err(SwageError::LlmApi { kind, detail }),
            None => Err(SwageError::LlmApi {
                kind: ApiErrorKind::Transient,
                detail: "mock script exhausted".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replies_in_push_order() {
        let transport = MockTransport::new();
        transport.push_json(json!({"step": 1}));
        transport.push_json(json!({"step": 2}));

        let request = LlmRequest::new("m", "s", "u");
        let first = transport.complete(&request).unwrap();
        let second = transport.complete(&request).unwrap();
        assert!(first.text.contains('1'));
        assert!(second.text.contains('2'));
        assert_eq!(transport.call_count(), 2);
    }

    #[test]
    fn test_exhausted_script_is_transient_error() {
        let transport = MockTransport::new();
        let request = LlmRequest::new("m", "s", "u");
        match transport.complete(&request) {
            Err(SwageError::LlmApi { kind, .. }) => assert_eq!(kind, ApiErrorKind::Transient),
            other => panic!("expected LlmApi error, got {other:?}"),
        }
    }

    #[test]
    fn test_records_prompts() {
        let transport = MockTransport::new();
        transport.push_text("ok");
        let request = LlmRequest::new("m", "sys", "the user prompt");
        let _ = transport.complete(&request);
        let seen = transport.requests_seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].user, "the user prompt");
    }
}
