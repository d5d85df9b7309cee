//! Supplier competency analysis from article history.

use serde_json::Value;

use super::{CapabilityLevel, Competency, CompetencyProfile};
use crate::confidence::Confidence;
use crate::error::{Result, SwageError};
use crate::llm::prompts;
use crate::llm::{str_field, str_list, LlmGateway, LlmOutcome, LlmRequest, SchemaSpec};
use crate::planner::Process;
use crate::supplier::SupplierProfile;

/// Analyzer output with clamping provenance.
#[derive(Debug, Clone)]
pub struct CompetencyAnalysis {
    pub profile: CompetencyProfile,
    /// Process labels the model emitted that are not in the taxonomy.
    pub dropped_labels: Vec<String>,
    /// Fields that validated but fell outside their allowed set.
    pub violations: Vec<String>,
    pub tokens_used: usize,
}

/// One-call competency analyzer.
pub struct CompetencyAnalyzer {
    gateway: LlmGateway,
    model: String,
    temperature: f64,
    max_tokens: usize,
}

impl CompetencyAnalyzer {
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

    /// Infer the supplier's capability profile from its article history.
    ///
    /// Enum fields are clamped onto the process taxonomy; unknown labels are
    /// dropped and reported, nothing else is post-checked.
    pub fn analyze(&self, supplier: &SupplierProfile) -> Result<CompetencyAnalysis> {
        let request = LlmRequest::new(
            &self.model,
            prompts::competency_system_prompt(),
            prompts::competency_prompt(supplier),
        )
        .with_max_tokens(self.max_tokens)
        .with_temperature(self.temperature);

        let schema = SchemaSpec::new().require("core_competencies");

        match self.gateway.call(&request, &schema) {
            LlmOutcome::Parsed {
                value,
                tokens_used,
                violations,
                ..
            } => {
                let (profile, dropped_labels) = parse_profile(&value);
                Ok(CompetencyAnalysis {
                    profile,
                    dropped_labels,
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

fn parse_profile(value: &Value) -> (CompetencyProfile, Vec<String>) {
    let mut dropped = Vec::new();
    let mut profile = CompetencyProfile {
        material_expertise: str_list(value, "material_expertise"),
        preferred_lot_sizes: str_list(value, "preferred_lot_sizes"),
        ..Default::default()
    };

    if let Some(entries) = value.get("core_competencies").and_then(|v| v.as_array()) {
        for entry in entries {
            let label = match str_field(entry, "process") {
                Some(l) => l,
                None => continue,
            };
            let process = match Process::from_label(&label) {
                Some(p) => p,
                None => {
                    dropped.push(label);
                    continue;
                }
            };
            profile.core_competencies.push(Competency {
                process,
                capability_level: str_field(entry, "capability_level")
                    .and_then(|l| CapabilityLevel::from_label(&l))
                    .unwrap_or(CapabilityLevel::Basic),
                confidence: str_field(entry, "confidence")
                    .and_then(|l| Confidence::from_label(&l))
                    .unwrap_or(Confidence::Medium),
                evidence: str_list(entry, "evidence"),
            });
        }
    }

    if let Some(map) = value
        .get("material_process_compatibility")
        .and_then(|v| v.as_object())
    {
        for (material, processes) in map {
            let clamped: Vec<Process> = processes
                .as_array()
                .map(|list| {
                    list.iter()
                        .filter_map(|p| p.as_str())
                        .filter_map(|label| match Process::from_label(label) {
                            Some(p) => Some(p),
                            None => {
                                dropped.push(label.to_string());
                                None
                            }
                        })
                        .collect()
                })
                .unwrap_or_default();
            if !clamped.is_empty() {
                profile
                    .material_process_compatibility
                    .insert(material.clone(), clamped);
            }
        }
    }

    for label in str_list(value, "unsuitable_processes") {
        match Process::from_label(&label) {
            Some(p) => profile.unsuitable_processes.push(p),
            None => dropped.push(label),
        }
    }

    (profile, dropped)
}
