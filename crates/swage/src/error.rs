//! Error types for the Swage library.

use thiserror::Error;

/// Main error type for Swage operations.
#[derive(Debug, Error)]
pub enum SwageError {
    /// Part description is empty or not usable text.
    #[error("Malformed input: {0}")]
    InputMalformed(String),

    /// Model output could not be validated against the expected schema.
    /// The raw text is retained so callers can fall back on it verbatim.
    #[error("LLM parse fallback: {reason}")]
    LlmParseFallback { reason: String, raw: String },

    /// Transport-level failure talking to the model API.
    #[error("LLM API error ({kind:?}): {detail}")]
    LlmApi { kind: ApiErrorKind, detail: String },

    /// A fabrication plan breached the regime cost ceiling. Produced by
    /// `PlanResult::require_feasible`; within an estimate the breach is
    /// carried on the plan's `infeasible` flag instead.
    #[error("Plan infeasible: {0}")]
    PlanInfeasible(String),

    /// The per-estimate deadline expired. Estimates never return this
    /// (expiry yields a partial result with a `cancelled_at` assumption);
    /// the variant is for callers that wrap individual pipeline steps in
    /// their own hard deadline.
    #[error("Cancelled at step '{0}': deadline exceeded")]
    Cancelled(String),

    /// Commodity feed failure (non-fatal to estimates; callers fall back).
    #[error("Commodity feed error: {0}")]
    Commodity(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Classification of model API failures.
///
/// Transient failures are recovered locally with deterministic defaults;
/// auth and quota failures are surfaced as non-fatal fields on the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Transient,
    Auth,
    Quota,
}

/// Result type alias for Swage operations.
pub type Result<T> = std::result::Result<T, SwageError>;
