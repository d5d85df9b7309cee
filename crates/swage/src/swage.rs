//! Top-level estimation engine.
//!
//! `Swage` wires the normalizers, the model-backed estimators and the pure
//! kernels into one `estimate` call. Within an estimate the engine never
//! aborts on a model failure; it downgrades confidence and records
//! assumptions. Only malformed input returns an error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::co2::{self, Co2Report, TransportMode};
use crate::commodity::{CachedFeed, CommodityFeed, CommodityPoint, LiveFeed, MockFeed};
use crate::confidence::Confidence;
use crate::error::{ApiErrorKind, Result, SwageError};
use crate::estimator::MaterialEstimator;
use crate::llm::anthropic::AnthropicTransport;
use crate::llm::{LlmGateway, LlmTransport};
use crate::normalize::{normalize, Material, PartFamily};
use crate::physics;
use crate::planner::{CostBreakdown, FabricationPlan, PlannerConfig, ProcessPlanner};
use crate::supplier::{
    CompetencyAnalyzer, CompetencyProfile, NegotiationPlan, NegotiationPlanner, RatingOutcome,
    SupplierProfile, SupplierRater, SupplierRating,
};

/// Commodity trend lookback fed to the feed, days.
const COMMODITY_HORIZON_DAYS: u32 = 90;

/// Commodity cache lifetime.
const COMMODITY_CACHE_MAX_AGE: Duration = Duration::from_secs(15 * 60);

/// Origin country assumed when neither the request nor the supplier names
/// one.
const DEFAULT_ORIGIN_COUNTRY: &str = "DE";

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Immutable engine configuration.
#[derive(Debug, Clone)]
pub struct SwageConfig {
    /// Model for estimation and negotiation calls.
    pub primary_model_id: String,
    /// Cheaper model for competency and process-planning calls.
    pub fast_model_id: String,
    pub temperature_estimator: f64,
    pub temperature_negotiation: f64,
    pub max_tokens: usize,
    pub commodity_enabled: bool,
    pub commodity_api_key: Option<String>,
    pub usd_eur_rate: f64,
    pub deadline_per_estimate: Duration,
    pub cbam_price_eur_per_ton: f64,
    /// Fab-cost ceiling at lot ≥ 100 000 (calibration parameter).
    pub fab_ceiling_high_auto: f64,
    /// Fab-cost ceiling at lot ≥ 300 000 (calibration parameter).
    pub fab_ceiling_multi_station: f64,
    /// Surface-treatment codes beyond the built-in set.
    pub coating_codes: Vec<String>,
}

impl Default for SwageConfig {
    fn default() -> Self {
        Self {
            primary_model_id: "claude-sonnet-4-20250514".to_string(),
            fast_model_id: "claude-3-5-haiku-20241022".to_string(),
            temperature_estimator: 0.1,
            temperature_negotiation: 0.15,
            max_tokens: 2048,
            commodity_enabled: true,
            commodity_api_key: None,
            usd_eur_rate: 0.92,
            deadline_per_estimate: Duration::from_secs(90),
            cbam_price_eur_per_ton: co2::DEFAULT_CBAM_PRICE_EUR_PER_TON,
            fab_ceiling_high_auto: 0.080,
            fab_ceiling_multi_station: 0.050,
            coating_codes: Vec::new(),
        }
    }
}

impl SwageConfig {
    pub fn with_primary_model(mut self, model: impl Into<String>) -> Self {
        self.primary_model_id = model.into();
        self
    }

    pub fn with_fast_model(mut self, model: impl Into<String>) -> Self {
        self.fast_model_id = model.into();
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_per_estimate = deadline;
        self
    }

    pub fn with_commodity_enabled(mut self, enabled: bool) -> Self {
        self.commodity_enabled = enabled;
        self
    }

    pub fn with_commodity_api_key(mut self, key: impl Into<String>) -> Self {
        self.commodity_api_key = Some(key.into());
        self
    }

    pub fn with_coating_codes(mut self, codes: Vec<String>) -> Self {
        self.coating_codes = codes;
        self
    }

    pub fn with_cbam_price(mut self, eur_per_ton: f64) -> Self {
        self.cbam_price_eur_per_ton = eur_per_ton;
        self
    }
}

// =============================================================================
// REQUEST / OUTPUT RECORDS
// =============================================================================

/// One estimation request.
#[derive(Debug, Clone)]
pub struct EstimateRequest {
    pub description: String,
    pub lot_size: u64,
    pub supplier: Option<SupplierProfile>,
    /// Origin country override; defaults to the supplier's, then `DE`.
    pub country: Option<String>,
    pub distance_km: Option<f64>,
    pub transport_mode: Option<TransportMode>,
}

impl EstimateRequest {
    pub fn new(description: impl Into<String>, lot_size: u64) -> Self {
        Self {
            description: description.into(),
            lot_size,
            supplier: None,
            country: None,
            distance_km: None,
            transport_mode: None,
        }
    }

    pub fn with_supplier(mut self, supplier: SupplierProfile) -> Self {
        self.supplier = Some(supplier);
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_distance_km(mut self, km: f64) -> Self {
        self.distance_km = Some(km);
        self
    }

    pub fn with_transport_mode(mut self, mode: TransportMode) -> Self {
        self.transport_mode = Some(mode);
        self
    }
}

/// Surface treatment and strength class recorded alongside the material.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength_class: Option<String>,
}

/// Parsed or model-filled geometry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diameter_mm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_mm: Option<f64>,
}

/// The assembled estimate, immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartEstimate {
    pub description: String,
    pub lot_size: u64,
    pub material: Material,
    pub material_details: MaterialDetails,
    pub family: PartFamily,
    pub geometry: Geometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass_kg: Option<f64>,
    pub material_price_eur_per_kg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_cost_eur_per_unit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commodity: Option<CommodityPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fabrication: Option<FabricationPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_breakdown: Option<CostBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fab_cost_eur_per_unit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_unit_cost_eur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2: Option<Co2Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competencies: Option<CompetencyProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<SupplierRating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negotiation: Option<NegotiationPlan>,
    pub confidence: Confidence,
    pub assumptions: Vec<String>,
    pub calculation_trace: Vec<String>,
    /// Auth/quota failures surfaced without failing the estimate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub llm_errors: Vec<String>,
    pub tokens_used: usize,
}

// =============================================================================
// DEADLINE
// =============================================================================

/// Per-estimate deadline, checked before every suspension point.
struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    /// `Some(note)` when the budget is spent; the note names the step that
    /// would have run next.
    fn cancel_note(&self, step: &str) -> Option<String> {
        if self.start.elapsed() >= self.budget {
            Some(format!("cancelled_at={}", step))
        } else {
            None
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// The estimation engine.
pub struct Swage {
    config: SwageConfig,
    gateway: LlmGateway,
    commodity: Option<Arc<dyn CommodityFeed>>,
}

impl Swage {
    /// Build an engine against the Anthropic API, reading the key from
    /// `ANTHROPIC_API_KEY`. The commodity feed is the live source when an
    /// API key is configured, the deterministic mock otherwise.
    pub fn new(config: SwageConfig) -> Result<Self> {
        let transport = Arc::new(AnthropicTransport::from_env()?);
        Self::with_transport(config, transport)
    }

    /// Build an engine over an explicit transport (tests use the mock).
    pub fn with_transport(config: SwageConfig, transport: Arc<dyn LlmTransport>) -> Result<Self> {
        let commodity: Option<Arc<dyn CommodityFeed>> = if config.commodity_enabled {
            match &config.commodity_api_key {
                Some(key) => Some(Arc::new(CachedFeed::new(
                    LiveFeed::new(key.clone(), config.usd_eur_rate)?,
                    COMMODITY_CACHE_MAX_AGE,
                ))),
                None => Some(Arc::new(MockFeed::new())),
            }
        } else {
            None
        };

        Ok(Self {
            gateway: LlmGateway::new(transport),
            config,
            commodity,
        })
    }

    /// Replace the commodity feed (tests inject scripted feeds).
    pub fn with_commodity_feed(mut self, feed: Arc<dyn CommodityFeed>) -> Self {
        self.commodity = Some(feed);
        self
    }

    pub fn config(&self) -> &SwageConfig {
        &self.config
    }

    /// Estimate cost, mass, CO₂ and supplier posture for one part.
    ///
    /// Fails only on malformed input. Model and feed failures degrade the
    /// estimate and are recorded in `assumptions` and `llm_errors`.
    pub fn estimate(&self, request: &EstimateRequest) -> Result<PartEstimate> {
        if request.description.trim().is_empty() {
            return Err(SwageError::InputMalformed(
                "part description is empty".to_string(),
            ));
        }
        if request.lot_size == 0 {
            return Err(SwageError::InputMalformed(
                "lot size must be positive".to_string(),
            ));
        }

        let deadline = Deadline::new(self.config.deadline_per_estimate);
        let mut assumptions: Vec<String> = Vec::new();
        let mut trace: Vec<String> = Vec::new();
        let mut llm_errors: Vec<String> = Vec::new();
        let mut confidence = Confidence::High;
        let mut tokens_used = 0;
        let mut cancelled = false;

        // C1: never fails.
        let part = normalize(&request.description, &self.config.coating_codes);
        trace.push(format!(
            "normalized: material={}, family={}, d={:?} mm, l={:?} mm",
            part.material, part.family, part.diameter_mm, part.length_mm
        ));
        if part.family != PartFamily::Washer {
            assumptions.push(physics::family_model_note(part.family).to_string());
        }

        // C5 + C2 cross-check.
        let mut material = part.material;
        let mut geometry = Geometry {
            diameter_mm: part.diameter_mm,
            length_mm: part.length_mm,
        };
        let mut mass_kg = None;
        let mut price_eur_per_kg = part.material.price_band_midpoint();
        let mut material_cost = None;
        let mut surface_treatment = part.surface_treatment.clone();

        if let Some(note) = deadline.cancel_note("estimator") {
            assumptions.push(note);
            cancelled = true;
        } else {
            let est = self.material_estimator().estimate(&part);
            material = est.material;
            geometry = Geometry {
                diameter_mm: est.diameter_mm,
                length_mm: est.length_mm,
            };
            mass_kg = est.mass_kg;
            price_eur_per_kg = est.price_eur_per_kg;
            material_cost = est.material_cost_eur_per_unit;
            if est.surface_treatment.is_some() {
                surface_treatment = est.surface_treatment;
            }
            confidence = confidence.min_with(est.confidence);
            assumptions.extend(est.assumptions);
            trace.extend(est.trace);
            tokens_used += est.tokens_used;
        }

        // C3: non-blocking; absence falls back to the estimator's price.
        let mut commodity = None;
        if !cancelled {
            if let Some(note) = deadline.cancel_note("commodity") {
                assumptions.push(note);
                cancelled = true;
            } else if let Some(feed) = &self.commodity {
                match feed.price_for(material, COMMODITY_HORIZON_DAYS) {
                    Ok(point) => {
                        let (band_lo, band_hi) = material.price_band_eur_per_kg();
                        if (band_lo..=band_hi).contains(&point.price_eur_per_kg) {
                            trace.push(format!(
                                "commodity ({}): {:.2} EUR/kg, trend {} ({:+.1}%)",
                                point.source,
                                point.price_eur_per_kg,
                                point.trend.label(),
                                point.trend_pct
                            ));
                            price_eur_per_kg = point.price_eur_per_kg;
                            material_cost = mass_kg.map(|m| m * price_eur_per_kg);
                        } else {
                            assumptions.push(format!(
                                "commodity price {:.2} EUR/kg outside the plausible band; estimator price kept",
                                point.price_eur_per_kg
                            ));
                        }
                        commodity = Some(point);
                    }
                    Err(err) => {
                        assumptions
                            .push(format!("commodity feed unavailable ({}); estimator price used", err));
                    }
                }
            }
        }

        // C7: only with history.
        let mut competencies = None;
        if !cancelled {
            if let Some(supplier) = request
                .supplier
                .as_ref()
                .filter(|s| !s.article_history.is_empty())
            {
                if let Some(note) = deadline.cancel_note("competencies") {
                    assumptions.push(note);
                    cancelled = true;
                } else {
                    match self.competency_analyzer().analyze(supplier) {
                        Ok(analysis) => {
                            tokens_used += analysis.tokens_used;
                            if !analysis.dropped_labels.is_empty() {
                                assumptions.push(format!(
                                    "competency labels outside the process taxonomy dropped: {}",
                                    analysis.dropped_labels.join(", ")
                                ));
                            }
                            if !analysis.violations.is_empty() {
                                confidence = confidence.min_with(Confidence::Low);
                                assumptions.push(format!(
                                    "competency response violated its schema: {}",
                                    analysis.violations.join("; ")
                                ));
                            }
                            competencies = Some(analysis.profile);
                        }
                        Err(err) => {
                            record_llm_failure(&err, &mut llm_errors, &mut assumptions, "competency analysis");
                            confidence = confidence.min_with(Confidence::Medium);
                        }
                    }
                }
            }
        }

        // C6: the plan degrades internally, it never errors.
        let mut fabrication = None;
        let mut cost_breakdown = None;
        let mut fab_cost = None;
        if !cancelled {
            if let Some(note) = deadline.cancel_note("plan") {
                assumptions.push(note);
                cancelled = true;
            } else {
                let result = self.process_planner().plan(
                    &part,
                    request.lot_size,
                    mass_kg,
                    competencies.as_ref(),
                );
                tokens_used += result.tokens_used;
                confidence = confidence.min_with(result.confidence);
                assumptions.extend(result.assumptions);
                trace.extend(result.trace);
                fab_cost = Some(result.breakdown.fab_per_unit_eur);
                cost_breakdown = Some(result.breakdown);
                fabrication = Some(result.plan);
            }
        }

        // C9: pure, runs even after cancellation when mass is known.
        let country = request
            .country
            .clone()
            .or_else(|| request.supplier.as_ref().map(|s| s.country.clone()))
            .unwrap_or_else(|| {
                assumptions.push(format!("origin country assumed {}", DEFAULT_ORIGIN_COUNTRY));
                DEFAULT_ORIGIN_COUNTRY.to_string()
            });
        let co2 = mass_kg.map(|m| {
            let report = co2::co2_footprint(
                m,
                material,
                &country,
                request.distance_km,
                request.transport_mode,
                self.config.cbam_price_eur_per_ton,
            );
            assumptions.extend(report.notes.iter().cloned());
            trace.push(format!(
                "co2: production {:.4} kg + transport {:.4} kg ({} over {:.0} km), cbam {:.4} EUR",
                report.production_kg,
                report.transport_kg,
                report.transport_mode,
                report.distance_km,
                report.cbam_cost_eur
            ));
            report
        });
        if co2.is_none() {
            assumptions.push("no mass; CO2 footprint skipped".to_string());
        }

        // C8: independent of cost; failures surface as absence.
        let mut rating = None;
        let mut negotiation = None;
        if !cancelled {
            if let Some(supplier) = &request.supplier {
                if let Some(note) = deadline.cancel_note("supplier_rating") {
                    assumptions.push(note);
                    cancelled = true;
                } else {
                    match self.supplier_rater().rate(supplier, commodity.as_ref()) {
                        Ok(outcome) => {
                            tokens_used += outcome.tokens_used;
                            if !outcome.violations.is_empty() {
                                confidence = confidence.min_with(Confidence::Low);
                                assumptions.push(format!(
                                    "rating response violated its schema: {}",
                                    outcome.violations.join("; ")
                                ));
                            }
                            rating = Some(outcome.rating);
                        }
                        Err(err) => {
                            record_llm_failure(&err, &mut llm_errors, &mut assumptions, "supplier rating");
                        }
                    }
                }
            }
        }
        if !cancelled {
            if let Some(supplier) = &request.supplier {
                if let Some(note) = deadline.cancel_note("negotiation") {
                    assumptions.push(note);
                    cancelled = true;
                } else {
                    let summary = estimate_summary(mass_kg, material_cost, fab_cost);
                    match self.negotiation_planner().plan(
                        supplier,
                        rating.as_ref(),
                        commodity.as_ref(),
                        &summary,
                    ) {
                        Ok(outcome) => {
                            tokens_used += outcome.tokens_used;
                            if !outcome.violations.is_empty() {
                                confidence = confidence.min_with(Confidence::Low);
                                assumptions.push(format!(
                                    "negotiation response violated its schema: {}",
                                    outcome.violations.join("; ")
                                ));
                            }
                            negotiation = Some(outcome.plan);
                        }
                        Err(err) => {
                            record_llm_failure(&err, &mut llm_errors, &mut assumptions, "negotiation plan");
                        }
                    }
                }
            }
        }

        if cancelled {
            confidence = Confidence::Low;
        }

        let total_unit_cost_eur = match (material_cost, fab_cost) {
            (Some(m), Some(f)) => Some(m + f),
            (None, Some(f)) => Some(f),
            (Some(m), None) => Some(m),
            (None, None) => None,
        };
        if let Some(total) = total_unit_cost_eur {
            trace.push(format!(
                "total: material {} + fabrication {} = {:.4} EUR/unit",
                material_cost.map(|c| format!("{:.4}", c)).unwrap_or_else(|| "-".to_string()),
                fab_cost.map(|c| format!("{:.4}", c)).unwrap_or_else(|| "-".to_string()),
                total
            ));
        }

        Ok(PartEstimate {
            description: request.description.clone(),
            lot_size: request.lot_size,
            material,
            material_details: MaterialDetails {
                surface_treatment,
                strength_class: part.strength_class.clone(),
            },
            family: part.family,
            geometry,
            mass_kg,
            material_price_eur_per_kg: price_eur_per_kg,
            material_cost_eur_per_unit: material_cost,
            commodity,
            fabrication,
            cost_breakdown,
            fab_cost_eur_per_unit: fab_cost,
            total_unit_cost_eur,
            co2,
            competencies,
            rating,
            negotiation,
            confidence,
            assumptions,
            calculation_trace: trace,
            llm_errors,
            tokens_used,
        })
    }

    /// Rate a supplier without running a full estimate.
    pub fn rate_supplier(&self, supplier: &SupplierProfile) -> Result<RatingOutcome> {
        let commodity = self.commodity_snapshot_for_history(supplier);
        self.supplier_rater().rate(supplier, commodity.as_ref())
    }

    /// Plan a negotiation without running a full estimate.
    pub fn plan_negotiation(
        &self,
        supplier: &SupplierProfile,
        rating: Option<&SupplierRating>,
        estimate_summary: &str,
    ) -> Result<NegotiationPlan> {
        let commodity = self.commodity_snapshot_for_history(supplier);
        Ok(self
            .negotiation_planner()
            .plan(supplier, rating, commodity.as_ref(), estimate_summary)?
            .plan)
    }

    /// Analyze supplier competencies without running a full estimate.
    pub fn analyze_competencies(&self, supplier: &SupplierProfile) -> Result<CompetencyProfile> {
        Ok(self.competency_analyzer().analyze(supplier)?.profile)
    }

    /// Steel snapshot for supplier-only operations; the part mix decides no
    /// better default.
    fn commodity_snapshot_for_history(&self, _supplier: &SupplierProfile) -> Option<CommodityPoint> {
        self.commodity
            .as_ref()
            .and_then(|feed| feed.price_for(Material::Steel, COMMODITY_HORIZON_DAYS).ok())
    }

    fn material_estimator(&self) -> MaterialEstimator {
        MaterialEstimator::new(self.gateway.clone(), &self.config.primary_model_id)
            .with_temperature(self.config.temperature_estimator)
            .with_max_tokens(self.config.max_tokens)
            .with_coating_codes(self.config.coating_codes.clone())
    }

    fn process_planner(&self) -> ProcessPlanner {
        ProcessPlanner::new(
            self.gateway.clone(),
            PlannerConfig {
                model: self.config.fast_model_id.clone(),
                temperature: self.config.temperature_estimator,
                max_tokens: self.config.max_tokens,
                ceiling_high_auto: self.config.fab_ceiling_high_auto,
                ceiling_multi_station: self.config.fab_ceiling_multi_station,
            },
        )
    }

    fn competency_analyzer(&self) -> CompetencyAnalyzer {
        CompetencyAnalyzer::new(self.gateway.clone(), &self.config.fast_model_id)
            .with_temperature(self.config.temperature_estimator)
            .with_max_tokens(self.config.max_tokens)
    }

    fn supplier_rater(&self) -> SupplierRater {
        SupplierRater::new(self.gateway.clone(), &self.config.primary_model_id)
            .with_temperature(self.config.temperature_estimator)
            .with_max_tokens(self.config.max_tokens)
    }

    fn negotiation_planner(&self) -> NegotiationPlanner {
        NegotiationPlanner::new(self.gateway.clone(), &self.config.primary_model_id)
            .with_temperature(self.config.temperature_negotiation)
            .with_max_tokens(self.config.max_tokens)
    }
}

/// One-line cost summary handed to the negotiation prompt.
fn estimate_summary(mass_kg: Option<f64>, material_cost: Option<f64>, fab_cost: Option<f64>) -> String {
    let mut parts = Vec::new();
    if let Some(m) = mass_kg {
        parts.push(format!("mass {:.2} g", m * 1000.0));
    }
    if let Some(c) = material_cost {
        parts.push(format!("material {:.4} EUR/unit", c));
    }
    if let Some(f) = fab_cost {
        parts.push(format!("fabrication {:.4} EUR/unit", f));
    }
    if parts.is_empty() {
        "no cost estimate available".to_string()
    } else {
        parts.join(", ")
    }
}

/// Auth and quota failures are caller-visible; everything else is an
/// assumption.
fn record_llm_failure(
    err: &SwageError,
    llm_errors: &mut Vec<String>,
    assumptions: &mut Vec<String>,
    step: &str,
) {
    match err {
        SwageError::LlmApi { kind, .. }
            if matches!(kind, ApiErrorKind::Auth | ApiErrorKind::Quota) =>
        {
            llm_errors.push(format!("{}: {}", step, err));
        }
        _ => {}
    }
    assumptions.push(format!("{} unavailable ({})", step, err));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockTransport;
    use serde_json::json;

    fn engine(transport: Arc<MockTransport>) -> Swage {
        let config = SwageConfig::default().with_commodity_enabled(false);
        Swage::with_transport(config, transport).unwrap()
    }

    fn push_estimator_reply(transport: &MockTransport) {
        transport.push_json(json!({
            "material": "steel",
            "mass_kg_per_unit": 0.0277,
            "material_price_eur_per_kg": 1.2,
            "step_by_step": ["volume = pi * 25 * 45 = 3534.29 mm^3"]
        }));
    }

    fn push_planner_replies(transport: &MockTransport) {
        transport.push_json(json!({
            "primary_process": "cold_forming",
            "secondary_processes": ["thread_rolling"],
            "expected_cycle_time_seconds": 2.0
        }));
        transport.push_json(json!({
            "primary": {
                "name": "cold_forming", "setup_time_min": 45, "cycle_time_s": 2.0,
                "machine_eur_h": 120, "labor_eur_h": 35, "overhead_pct": 0.2
            },
            "secondary_ops": [],
            "route_narrative": ["cold form", "roll thread"],
            "fab_cost_eur_per_unit": 0.11
        }));
    }

    #[test]
    fn test_estimate_rejects_empty_description() {
        let transport = Arc::new(MockTransport::new());
        let err = engine(transport)
            .estimate(&EstimateRequest::new("   ", 1000))
            .unwrap_err();
        assert!(matches!(err, SwageError::InputMalformed(_)));
    }

    #[test]
    fn test_estimate_rejects_zero_lot() {
        let transport = Arc::new(MockTransport::new());
        let err = engine(transport)
            .estimate(&EstimateRequest::new("DIN933 M8×25", 0))
            .unwrap_err();
        assert!(matches!(err, SwageError::InputMalformed(_)));
    }

    #[test]
    fn test_estimate_assembles_costs() {
        let transport = Arc::new(MockTransport::new());
        push_estimator_reply(&transport);
        push_planner_replies(&transport);

        let estimate = engine(transport)
            .estimate(&EstimateRequest::new("ISO 4028 M10×45", 11_815))
            .unwrap();

        let material = estimate.material_cost_eur_per_unit.unwrap();
        let fab = estimate.fab_cost_eur_per_unit.unwrap();
        assert!((estimate.total_unit_cost_eur.unwrap() - (material + fab)).abs() < 1e-9);
        assert!((material - estimate.mass_kg.unwrap() * estimate.material_price_eur_per_kg).abs() < 1e-6);
        assert!(estimate.co2.is_some());
    }

    #[test]
    fn test_deadline_already_spent_yields_partial() {
        let transport = Arc::new(MockTransport::new());
        let config = SwageConfig::default()
            .with_commodity_enabled(false)
            .with_deadline(Duration::from_secs(0));
        let swage = Swage::with_transport(config, transport.clone()).unwrap();

        let estimate = swage
            .estimate(&EstimateRequest::new("ISO 4028 M10×45", 1_000))
            .unwrap();
        assert_eq!(estimate.confidence, Confidence::Low);
        assert!(estimate
            .assumptions
            .iter()
            .any(|a| a.starts_with("cancelled_at=")));
        assert!(estimate.fabrication.is_none());
        // No model call was made after cancellation.
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_quota_failure_surfaces_in_llm_errors() {
        let transport = Arc::new(MockTransport::new());
        push_estimator_reply(&transport);
        push_planner_replies(&transport);
        // Rating call hits a quota error; negotiation succeeds.
        transport.push_failure(ApiErrorKind::Quota, "429");
        transport.push_json(json!({
            "strategy_overview": "s",
            "opening_statement": "o",
            "closing_statement": "c"
        }));

        let supplier = SupplierProfile {
            name: "Muster GmbH".to_string(),
            country: "DE".to_string(),
            article_history: Vec::new(),
            price_history_eur: vec![0.1],
        };
        let estimate = engine(transport)
            .estimate(&EstimateRequest::new("ISO 4028 M10×45", 11_815).with_supplier(supplier))
            .unwrap();

        assert!(estimate.rating.is_none());
        assert!(estimate.negotiation.is_some());
        assert_eq!(estimate.llm_errors.len(), 1);
        assert!(estimate.llm_errors[0].contains("supplier rating"));
    }

    #[test]
    fn test_country_defaults_to_supplier() {
        let transport = Arc::new(MockTransport::new());
        push_estimator_reply(&transport);
        push_planner_replies(&transport);
        transport.push_failure(ApiErrorKind::Transient, "down"); // rating
        transport.push_failure(ApiErrorKind::Transient, "down"); // negotiation

        let supplier = SupplierProfile {
            name: "Shenzhen Fastener Co".to_string(),
            country: "CN".to_string(),
            article_history: Vec::new(),
            price_history_eur: Vec::new(),
        };
        let estimate = engine(transport)
            .estimate(&EstimateRequest::new("ISO 4028 M10×45", 11_815).with_supplier(supplier))
            .unwrap();

        let co2 = estimate.co2.unwrap();
        assert!(!co2.is_eu_source);
        assert!(co2.cbam_cost_eur > 0.0);
    }
}
