//! Supplier rating.

use super::{RiskLevel, SupplierProfile, SupplierRating};
use crate::commodity::CommodityPoint;
use crate::error::{Result, SwageError};
use crate::llm::prompts;
use crate::llm::{num_field, str_field, str_list, LlmGateway, LlmOutcome, LlmRequest, SchemaSpec};

#[derive(Debug, Clone)]
pub struct RatingOutcome {
    pub rating: SupplierRating,
    /// Fields that validated but fell outside their allowed set.
    pub violations: Vec<String>,
    pub tokens_used: usize,
}

/// One-call supplier rater.
pub struct SupplierRater {
    gateway: LlmGateway,
    model: String,
    temperature: f64,
    max_tokens: usize,
}

impl SupplierRater {
    pub fn new(gateway: LlmGateway, model: impl Into<String>) -> Self {
        Self {
            gateway,
            model: model.into(),
            temperature: 0.1,
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

    /// Rate the supplier. The integer score is clamped to 1..=10 and the
    /// risk level onto its enum; prose fields pass through untouched.
    pub fn rate(
        &self,
        supplier: &SupplierProfile,
        commodity: Option<&CommodityPoint>,
    ) -> Result<RatingOutcome> {
        let request = LlmRequest::new(
            &self.model,
            prompts::rating_system_prompt(),
            prompts::rating_prompt(supplier, commodity),
        )
        .with_max_tokens(self.max_tokens)
        .with_temperature(self.temperature);

        let schema = SchemaSpec::new()
            .numeric("rating")
            .one_of("risk_level", &["low", "medium", "high", "critical"]);

        match self.gateway.call(&request, &schema) {
            LlmOutcome::Parsed {
                value,
                tokens_used,
                violations,
                ..
            } => {
                let score = num_field(&value, "rating").unwrap_or(5.0);
                let rating = SupplierRating {
                    rating: (score.round() as i64).clamp(1, 10) as u8,
                    risk_level: str_field(&value, "risk_level")
                        .and_then(|l| RiskLevel::from_label(&l))
                        .unwrap_or(RiskLevel::Medium),
                    company_analysis: str_field(&value, "company_analysis"),
                    country_analysis: str_field(&value, "country_analysis"),
                    article_fit: str_field(&value, "article_fit"),
                    strengths: str_list(&value, "strengths"),
                    weaknesses: str_list(&value, "weaknesses"),
                    recommendations: str_list(&value, "recommendations"),
                };
                Ok(RatingOutcome {
                    rating,
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
