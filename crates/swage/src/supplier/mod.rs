//! Supplier intelligence: competency analysis, rating and negotiation
//! planning.
//!
//! All three operations are model-backed with schema validation; out-of-set
//! enum values are clamped onto the fixed taxonomies, everything else is
//! passed through as the model wrote it.

mod competency;
mod negotiation;
mod rating;

pub use competency::{CompetencyAnalysis, CompetencyAnalyzer};
pub use negotiation::{NegotiationOutcome, NegotiationPlanner};
pub use rating::{RatingOutcome, SupplierRater};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;
use crate::planner::Process;

/// Supplier master data as supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierProfile {
    pub name: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    /// Historical part descriptions, most recent first.
    #[serde(default)]
    pub article_history: Vec<String>,
    /// Historical unit prices in EUR, oldest first.
    #[serde(default)]
    pub price_history_eur: Vec<f64>,
}

/// Demonstrated capability level for one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityLevel {
    Basic,
    Proficient,
    Expert,
}

impl CapabilityLevel {
    pub fn label(&self) -> &'static str {
        match self {
            CapabilityLevel::Basic => "basic",
            CapabilityLevel::Proficient => "proficient",
            CapabilityLevel::Expert => "expert",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "basic" => Some(CapabilityLevel::Basic),
            "proficient" | "intermediate" => Some(CapabilityLevel::Proficient),
            "expert" | "advanced" => Some(CapabilityLevel::Expert),
            _ => None,
        }
    }
}

/// One inferred competency with its supporting evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competency {
    pub process: Process,
    pub capability_level: CapabilityLevel,
    pub confidence: Confidence,
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// Inferred supplier capability profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetencyProfile {
    pub core_competencies: Vec<Competency>,
    #[serde(default)]
    pub material_expertise: Vec<String>,
    /// Material family to the processes the supplier runs on it.
    #[serde(default)]
    pub material_process_compatibility: IndexMap<String, Vec<Process>>,
    #[serde(default)]
    pub unsuitable_processes: Vec<Process>,
    #[serde(default)]
    pub preferred_lot_sizes: Vec<String>,
}

impl CompetencyProfile {
    /// Render the profile for the route-identification prompt.
    pub fn to_prompt_string(&self) -> String {
        let mut lines = Vec::new();
        if self.core_competencies.is_empty() {
            lines.push("- No demonstrated competencies recorded.".to_string());
        }
        for comp in &self.core_competencies {
            lines.push(format!(
                "- {} ({}, confidence {})",
                comp.process,
                comp.capability_level.label(),
                comp.confidence.label()
            ));
        }
        if !self.material_expertise.is_empty() {
            lines.push(format!(
                "- Material expertise: {}",
                self.material_expertise.join(", ")
            ));
        }
        if !self.unsuitable_processes.is_empty() {
            lines.push(format!(
                "- Unsuitable processes: {}",
                self.unsuitable_processes
                    .iter()
                    .map(|p| p.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        if !self.preferred_lot_sizes.is_empty() {
            lines.push(format!(
                "- Preferred lot sizes: {}",
                self.preferred_lot_sizes.join(", ")
            ));
        }
        lines.join("\n")
    }
}

/// Sourcing risk grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" | "moderate" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            "critical" | "severe" => Some(RiskLevel::Critical),
            _ => None,
        }
    }
}

/// Supplier rating, 1 (worst) to 10 (best).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierRating {
    pub rating: u8,
    pub risk_level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_fit: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Negotiation goal and fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NegotiationObjectives {
    pub primary_goal: String,
    pub batna: String,
}

/// Full negotiation playbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationPlan {
    pub strategy_overview: String,
    pub objectives: NegotiationObjectives,
    #[serde(default)]
    pub key_arguments: Vec<String>,
    #[serde(default)]
    pub tactics: Vec<String>,
    #[serde(default)]
    pub concessions: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    pub opening_statement: String,
    pub closing_statement: String,
    /// Commodity trend label recorded alongside the plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_trend: Option<String>,
}
