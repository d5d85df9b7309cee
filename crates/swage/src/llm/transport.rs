//! Transport trait and request/reply records.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One completion request. Self-contained: transports keep no cross-call
/// state beyond the HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Model identifier (e.g. "claude-sonnet-4-20250514").
    pub model: String,
    /// System text.
    pub system: String,
    /// User text.
    pub user: String,
    /// Maximum tokens in the response.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f64,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            user: user.into(),
            max_tokens: 2048,
            temperature: 0.1,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Raw completion text plus token accounting.
#[derive(Debug, Clone)]
pub struct LlmReply {
    pub text: String,
    pub tokens_used: usize,
}

/// Trait for model transports.
///
/// Implementations must be thread-safe (Send + Sync) so one transport can be
/// shared across concurrent estimates. Failures map to
/// [`SwageError::LlmApi`](crate::SwageError::LlmApi) with a classified kind.
pub trait LlmTransport: Send + Sync {
    /// Execute one completion.
    fn complete(&self, request: &LlmRequest) -> Result<LlmReply>;

    /// Name of this transport (for traces).
    fn name(&self) -> &str;
}
