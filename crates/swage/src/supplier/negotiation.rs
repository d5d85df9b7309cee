//! Negotiation planning.

use super::{NegotiationObjectives, NegotiationPlan, SupplierProfile, SupplierRating};
use crate::commodity::CommodityPoint;
use crate::error::{Result, SwageError};
use crate::llm::prompts;
use crate::llm::{str_field, str_list, LlmGateway, LlmOutcome, LlmRequest, SchemaSpec};

#[derive(Debug, Clone)]
pub struct NegotiationOutcome {
    pub plan: NegotiationPlan,
    /// Fields that validated but fell outside their allowed set.
    pub violations: Vec<String>,
    pub tokens_used: usize,
}

/// One-call negotiation planner. Runs slightly warmer than the estimation
/// calls so the playbooks read like playbooks, not bullet dumps.
pub struct NegotiationPlanner {
    gateway: LlmGateway,
    model: String,
    temperature: f64,
    max_tokens: usize,
}

impl NegotiationPlanner {
    pub fn new(gateway: LlmGateway, model: impl Into<String>) -> Self {
        Self {
            gateway,
            model: model.into(),
            temperature: 0.15,
            max_tokens: 2048,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Build a negotiation plan. The commodity trend snapshot passed here
    /// must be the one stored on the estimate so the plan and the record
    /// argue from the same market.
    pub fn plan(
        &self,
        supplier: &SupplierProfile,
        rating: Option<&SupplierRating>,
        commodity: Option<&CommodityPoint>,
        estimate_summary: &str,
    ) -> Result<NegotiationOutcome> {
        let request = LlmRequest::new(
            &self.model,
            prompts::negotiation_system_prompt(),
            prompts::negotiation_prompt(supplier, rating, commodity, estimate_summary),
        )
        .with_max_tokens(self.max_tokens)
        .with_temperature(self.temperature);

        let schema = SchemaSpec::new()
            .require("strategy_overview")
            .require("opening_statement");

        match self.gateway.call(&request, &schema) {
            LlmOutcome::Parsed {
                value,
                tokens_used,
                violations,
                ..
            } => {
                let objectives = value
                    .get("objectives")
                    .map(|obj| NegotiationObjectives {
                        primary_goal: str_field(obj, "primary_goal").unwrap_or_default(),
                        batna: str_field(obj, "batna").unwrap_or_default(),
                    })
                    .unwrap_or_default();
                let plan = NegotiationPlan {
                    strategy_overview: str_field(&value, "strategy_overview")
                        .unwrap_or_default(),
                    objectives,
                    key_arguments: str_list(&value, "key_arguments"),
                    tactics: str_list(&value, "tactics"),
                    concessions: str_list(&value, "concessions"),
                    red_flags: str_list(&value, "red_flags"),
                    opening_statement: str_field(&value, "opening_statement")
                        .unwrap_or_default(),
                    closing_statement: str_field(&value, "closing_statement")
                        .unwrap_or_default(),
                    market_trend: commodity.map(|c| c.trend.label().to_string()),
                };
                Ok(NegotiationOutcome {
                    plan,
                    violations,
                    tokens_used,
                })
            }
            LlmOutcome::ParseFallback { reason, raw, .. } => {
                Err(SwageError::LlmParseFallback { reason, raw })
            }
            LlmOutcome::ApiError { kind, detail } => Err(SwageError::LlmApi { kind, detail }),
        }
    }
}
