//! LLM gateway: every model call in the system goes through one entry point.
//!
//! The gateway owns the parts that must never be trusted to a model: layered
//! JSON extraction, declarative schema validation, and a tagged outcome that
//! forces callers to handle parse fallbacks and API failures explicitly.
//! Retries are the caller's decision; the gateway never loops and keeps no
//! state between calls.

mod gateway;
mod schema;
mod transport;

pub mod anthropic;
pub mod mock;
pub mod prompts;

pub use gateway::{LlmGateway, LlmOutcome};
pub use schema::{num_field, str_field, str_list, SchemaSpec};
pub use transport::{LlmReply, LlmRequest, LlmTransport};
