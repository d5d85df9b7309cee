//! Material and geometry estimation with deterministic cross-checks.
//!
//! One model call proposes material, geometry, mass and raw-material price;
//! every number is then checked against the rule chain and the physics
//! kernel, and the deterministic value wins wherever the model strays.

use crate::confidence::Confidence;
use crate::llm::prompts;
use crate::llm::{num_field, str_field, str_list, LlmGateway, LlmOutcome, LlmRequest, SchemaSpec};
use crate::normalize::{classify_material, Material, NormalizedPart};
use crate::physics;

/// Model mass may deviate this much from the physics kernel before the
/// deterministic value replaces it.
const MASS_TOLERANCE: f64 = 0.10;

/// Estimator output, pre-fabrication.
#[derive(Debug, Clone)]
pub struct MaterialEstimate {
    pub material: Material,
    pub diameter_mm: Option<f64>,
    pub length_mm: Option<f64>,
    pub mass_kg: Option<f64>,
    pub price_eur_per_kg: f64,
    pub material_cost_eur_per_unit: Option<f64>,
    pub surface_treatment: Option<String>,
    pub confidence: Confidence,
    pub assumptions: Vec<String>,
    pub trace: Vec<String>,
    pub tokens_used: usize,
}

/// Grounded few-shot material estimator.
pub struct MaterialEstimator {
    gateway: LlmGateway,
    model: String,
    temperature: f64,
    max_tokens: usize,
    coating_codes: Vec<String>,
}

impl MaterialEstimator {
    pub fn new(gateway: LlmGateway, model: impl Into<String>) -> Self {
        Self {
            gateway,
            model: model.into(),
            temperature: 0.1,
            max_tokens: 2048,
            coating_codes: Vec::new(),
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

    /// Extra coating codes beyond the built-in set, from configuration.
    pub fn with_coating_codes(mut self, codes: Vec<String>) -> Self {
        self.coating_codes = codes;
        self
    }

    /// Estimate material, mass and price for a normalized part.
    ///
    /// Never fails: a model failure degrades to the fully deterministic
    /// estimate at `confidence = low`.
    pub fn estimate(&self, part: &NormalizedPart) -> MaterialEstimate {
        let request = LlmRequest::new(
            &self.model,
            prompts::estimator_system_prompt(),
            prompts::estimator_prompt(part),
        )
        .with_max_tokens(self.max_tokens)
        .with_temperature(self.temperature);

        let schema = SchemaSpec::new()
            .require("material")
            .numeric("mass_kg_per_unit")
            .numeric("material_price_eur_per_kg");

        match self.gateway.call(&request, &schema) {
            LlmOutcome::Parsed {
                value,
                tokens_used,
                violations,
                ..
            } => {
                let mut estimate = self.reconcile(part, &value, tokens_used);
                if !violations.is_empty() {
                    estimate.confidence = Confidence::Low;
                    estimate
                        .assumptions
                        .push(format!("model response had schema violations: {}", violations.join("; ")));
                }
                estimate
            }
            LlmOutcome::ParseFallback {
                reason,
                tokens_used,
                ..
            } => {
                let mut estimate = self.deterministic_estimate(part, tokens_used);
                estimate
                    .assumptions
                    .push(format!("model response unparseable ({}); deterministic estimate used", reason));
                estimate
            }
            LlmOutcome::ApiError { detail, .. } => {
                let mut estimate = self.deterministic_estimate(part, 0);
                estimate
                    .assumptions
                    .push(format!("model call failed ({}); deterministic estimate used", detail));
                estimate
            }
        }
    }

    /// Cross-check the model's numbers against the deterministic pipeline.
    fn reconcile(
        &self,
        part: &NormalizedPart,
        value: &serde_json::Value,
        tokens_used: usize,
    ) -> MaterialEstimate {
        let mut assumptions = Vec::new();
        let mut trace = Vec::new();
        let mut confidence = Confidence::High;

        // Material: the rule chain wins whenever any chain rule fired, the
        // strength-class rule included; the model only gets a say where the
        // chain fell through to its default.
        let classification = classify_material(&part.raw, &self.coating_codes);
        let model_material = str_field(value, "material").and_then(|l| Material::from_label(&l));
        let material = match model_material {
            Some(m) if m != classification.material => {
                if classification.matched_rule < 7 {
                    assumptions.push(format!(
                        "model proposed material {}; rule-based classification {} kept",
                        m, classification.material
                    ));
                    classification.material
                } else {
                    assumptions.push(format!(
                        "material {} taken from model (rule chain defaulted to {})",
                        m, classification.material
                    ));
                    m
                }
            }
            Some(m) => m,
            None => {
                assumptions.push(format!(
                    "model material unrecognized; {} from rule chain used",
                    classification.material
                ));
                confidence = confidence.min_with(Confidence::Medium);
                classification.material
            }
        };

        // Geometry: parsed dimensions win; the model may fill gaps.
        let diameter_mm = part.diameter_mm.or_else(|| {
            let d = num_field(value, "d_mm").filter(|d| (1.0..=2000.0).contains(d));
            if d.is_some() {
                assumptions.push("diameter taken from model, not parsed from the description".to_string());
            }
            d
        });
        let length_mm = part.length_mm.or_else(|| {
            let l = num_field(value, "l_mm").filter(|l| (1.0..=5000.0).contains(l));
            if l.is_some() {
                assumptions.push("length taken from model, not parsed from the description".to_string());
            }
            l
        });

        // Mass: the physics kernel is authoritative beyond the tolerance.
        let physics_mass = physics::family_mass_kg(part.family, material, diameter_mm, length_mm);
        let model_mass = num_field(value, "mass_kg_per_unit").filter(|m| *m > 0.0);
        let mass_kg = match (physics_mass, model_mass) {
            (Some(p), Some(m)) => {
                if ((m - p) / p).abs() > MASS_TOLERANCE {
                    assumptions.push(format!(
                        "model mass {:.2} g deviated >{:.0}% from computed {:.2} g; computed value used",
                        m * 1000.0,
                        MASS_TOLERANCE * 100.0,
                        p * 1000.0
                    ));
                    trace.push(mass_trace(part, material, diameter_mm, length_mm, p));
                    Some(p)
                } else {
                    trace.push(format!("mass: model {:.2} g within tolerance of computed {:.2} g", m * 1000.0, p * 1000.0));
                    Some(m)
                }
            }
            (Some(p), None) => {
                assumptions.push("model omitted mass; computed value used".to_string());
                trace.push(mass_trace(part, material, diameter_mm, length_mm, p));
                Some(p)
            }
            (None, Some(m)) => {
                assumptions.push("no usable geometry; mass taken from model unchecked".to_string());
                confidence = confidence.min_with(Confidence::Medium);
                Some(m)
            }
            (None, None) => {
                assumptions.push("no geometry and no model mass; material cost omitted".to_string());
                confidence = confidence.min_with(Confidence::Low);
                None
            }
        };

        // Price: clamp to the family band.
        let (band_lo, band_hi) = material.price_band_eur_per_kg();
        let model_price = num_field(value, "material_price_eur_per_kg").filter(|p| *p > 0.0);
        let price_eur_per_kg = match model_price {
            Some(p) if (band_lo..=band_hi).contains(&p) => p,
            Some(p) => {
                let mid = material.price_band_midpoint();
                assumptions.push(format!(
                    "model price {:.2} EUR/kg outside the {:.2}-{:.2} band; midpoint {:.2} used",
                    p, band_lo, band_hi, mid
                ));
                confidence = confidence.capped_at(Confidence::Medium);
                mid
            }
            None => {
                let mid = material.price_band_midpoint();
                assumptions.push(format!("no usable model price; band midpoint {:.2} EUR/kg used", mid));
                confidence = confidence.capped_at(Confidence::Medium);
                mid
            }
        };

        for line in str_list(value, "step_by_step") {
            trace.push(format!("model: {}", line));
        }

        let material_cost_eur_per_unit = mass_kg.map(|m| m * price_eur_per_kg);
        if let (Some(mass), Some(cost)) = (mass_kg, material_cost_eur_per_unit) {
            trace.push(format!(
                "material cost: {:.5} kg * {:.2} EUR/kg = {:.5} EUR/unit",
                mass, price_eur_per_kg, cost
            ));
        }

        MaterialEstimate {
            material,
            diameter_mm,
            length_mm,
            mass_kg,
            price_eur_per_kg,
            material_cost_eur_per_unit,
            surface_treatment: classification
                .surface_treatment
                .or_else(|| str_field(value, "coating")),
            confidence,
            assumptions,
            trace,
            tokens_used,
        }
    }

    /// Model-free estimate from the rule chain, physics kernel and price
    /// band midpoint.
    fn deterministic_estimate(&self, part: &NormalizedPart, tokens_used: usize) -> MaterialEstimate {
        let classification = classify_material(&part.raw, &self.coating_codes);
        let material = classification.material;
        let mass_kg =
            physics::family_mass_kg(part.family, material, part.diameter_mm, part.length_mm);
        let price_eur_per_kg = material.price_band_midpoint();
        let mut trace = Vec::new();
        if let Some(m) = mass_kg {
            trace.push(mass_trace(part, material, part.diameter_mm, part.length_mm, m));
        }
        let material_cost_eur_per_unit = mass_kg.map(|m| m * price_eur_per_kg);

        MaterialEstimate {
            material,
            diameter_mm: part.diameter_mm,
            length_mm: part.length_mm,
            mass_kg,
            price_eur_per_kg,
            material_cost_eur_per_unit,
            surface_treatment: classification.surface_treatment,
            confidence: Confidence::Low,
            assumptions: Vec::new(),
            trace,
            tokens_used,
        }
    }
}

fn mass_trace(
    part: &NormalizedPart,
    material: Material,
    diameter_mm: Option<f64>,
    length_mm: Option<f64>,
    mass_kg: f64,
) -> String {
    format!(
        "mass ({}): d={} mm, l={} mm, density {:.2} g/cm^3 -> {:.2} g",
        part.family,
        diameter_mm.map(|d| format!("{:.1}", d)).unwrap_or_else(|| "?".to_string()),
        length_mm.map(|l| format!("{:.1}", l)).unwrap_or_else(|| "?".to_string()),
        material.density_g_cm3(),
        mass_kg * 1000.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;
    use crate::llm::mock::MockTransport;
    use crate::normalize::normalize;
    use serde_json::json;
    use std::sync::Arc;

    fn estimator(transport: MockTransport) -> MaterialEstimator {
        MaterialEstimator::new(LlmGateway::new(Arc::new(transport)), "primary")
    }

    #[test]
    fn test_mass_override_beyond_tolerance() {
        let transport = MockTransport::new();
        transport.push_json(json!({
            "material": "steel",
            "mass_kg_per_unit": 0.050,
            "material_price_eur_per_kg": 1.2,
            "step_by_step": ["volume = pi * 25 * 45"]
        }));
        let part = normalize("Gewindestift ISO 4028 M10×45", &[]);

        let estimate = estimator(transport).estimate(&part);
        // Computed 27.74 g wins over the model's 50 g.
        assert!((estimate.mass_kg.unwrap() - 0.02774).abs() < 1e-4);
        assert!(estimate.assumptions.iter().any(|a| a.contains("computed value used")));
    }

    #[test]
    fn test_model_mass_within_tolerance_kept() {
        let transport = MockTransport::new();
        transport.push_json(json!({
            "material": "steel",
            "mass_kg_per_unit": 0.0285,
            "material_price_eur_per_kg": 1.2
        }));
        let part = normalize("Gewindestift ISO 4028 M10×45", &[]);

        let estimate = estimator(transport).estimate(&part);
        assert_eq!(estimate.mass_kg, Some(0.0285));
        assert_eq!(estimate.confidence, Confidence::High);
    }

    #[test]
    fn test_coating_code_reclassified_to_steel() {
        let transport = MockTransport::new();
        transport.push_json(json!({
            "material": "stainless_a2",
            "mass_kg_per_unit": 0.012,
            "material_price_eur_per_kg": 3.0
        }));
        let part = normalize("DIN933-(A2K)-M8×25", &[]);

        let estimate = estimator(transport).estimate(&part);
        assert_eq!(estimate.material, Material::Steel);
        assert!(estimate.assumptions.iter().any(|a| a.contains("rule-based classification")));
        // Price was in the stainless band but not the steel band.
        assert!((estimate.price_eur_per_kg - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_strength_class_holds_against_model_material() {
        let transport = MockTransport::new();
        transport.push_json(json!({
            "material": "stainless_a2",
            "mass_kg_per_unit": 0.0067,
            "material_price_eur_per_kg": 3.3
        }));
        // A strength class is only defined for carbon steel; the chain rule
        // it fires is binding, not a fallthrough the model may override.
        let part = normalize("Sechskantschraube M6×30 8.8", &[]);

        let estimate = estimator(transport).estimate(&part);
        assert_eq!(estimate.material, Material::Steel);
        assert!(estimate
            .assumptions
            .iter()
            .any(|a| a.contains("rule-based classification")));
    }

    #[test]
    fn test_price_clamped_to_band_midpoint() {
        let transport = MockTransport::new();
        transport.push_json(json!({
            "material": "steel",
            "mass_kg_per_unit": 0.0277,
            "material_price_eur_per_kg": 12.0
        }));
        let part = normalize("ISO 4028 M10×45", &[]);

        let estimate = estimator(transport).estimate(&part);
        assert!((estimate.price_eur_per_kg - 1.2).abs() < 1e-9);
        assert!(estimate.confidence <= Confidence::Medium);
    }

    #[test]
    fn test_material_cost_is_product() {
        let transport = MockTransport::new();
        transport.push_json(json!({
            "material": "steel",
            "mass_kg_per_unit": 0.0277,
            "material_price_eur_per_kg": 1.1
        }));
        let part = normalize("ISO 4028 M10×45", &[]);

        let estimate = estimator(transport).estimate(&part);
        let expected = estimate.mass_kg.unwrap() * estimate.price_eur_per_kg;
        assert!((estimate.material_cost_eur_per_unit.unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_api_error_degrades_to_deterministic() {
        let transport = MockTransport::new();
        transport.push_failure(ApiErrorKind::Transient, "503");
        let part = normalize("ISO 4028 M10×45", &[]);

        let estimate = estimator(transport).estimate(&part);
        assert_eq!(estimate.confidence, Confidence::Low);
        assert!((estimate.mass_kg.unwrap() - 0.02774).abs() < 1e-4);
        assert!((estimate.price_eur_per_kg - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_reply_keeps_token_count() {
        let transport = MockTransport::new();
        let reply = "The part is probably steel, roughly thirty grams per unit.";
        transport.push_text(reply);
        let part = normalize("ISO 4028 M10×45", &[]);

        let estimate = estimator(transport).estimate(&part);
        assert_eq!(estimate.confidence, Confidence::Low);
        // The reply consumed tokens even though it never parsed.
        assert_eq!(estimate.tokens_used, reply.len() / 4);
        assert!(estimate.tokens_used > 0);
    }

    #[test]
    fn test_no_geometry_no_mass() {
        let transport = MockTransport::new();
        transport.push_json(json!({
            "material": "steel",
            "mass_kg_per_unit": 0,
            "material_price_eur_per_kg": 1.2
        }));
        let part = normalize("Sonderteil ohne Abmessungen", &[]);

        let estimate = estimator(transport).estimate(&part);
        assert_eq!(estimate.mass_kg, None);
        assert_eq!(estimate.material_cost_eur_per_unit, None);
        assert_eq!(estimate.confidence, Confidence::Low);
    }
}
