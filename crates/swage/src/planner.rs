//! Process planner: lot-size regimes, route identification and per-unit
//! fabrication costing.
//!
//! Two sequential model calls produce a route and a cost breakdown; the
//! planner then recomputes every cost equation from the returned parameters
//! and replaces the model's stated total with the recomputed one. The model
//! proposes, the arithmetic disposes.

use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;
use crate::error::{Result, SwageError};
use crate::llm::prompts;
use crate::llm::{num_field, str_field, str_list, LlmGateway, LlmOutcome, LlmRequest, SchemaSpec};
use crate::normalize::NormalizedPart;
use crate::supplier::CompetencyProfile;

// =============================================================================
// REGIMES
// =============================================================================

/// Lot-size band selecting automation level and cycle-time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Manual,
    SemiAuto,
    FullAuto,
    HighAuto,
    MultiStation,
}

impl Regime {
    pub fn from_lot_size(lot_size: u64) -> Self {
        match lot_size {
            0..=999 => Regime::Manual,
            1_000..=9_999 => Regime::SemiAuto,
            10_000..=99_999 => Regime::FullAuto,
            100_000..=299_999 => Regime::HighAuto,
            _ => Regime::MultiStation,
        }
    }

    /// Expected primary cycle time band in seconds.
    pub fn cycle_band_s(&self) -> (f64, f64) {
        match self {
            Regime::Manual => (5.0, 15.0),
            Regime::SemiAuto => (2.0, 5.0),
            Regime::FullAuto => (1.0, 3.0),
            Regime::HighAuto => (0.8, 1.2),
            Regime::MultiStation => (0.5, 0.8),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Regime::Manual => "manual",
            Regime::SemiAuto => "semi-auto",
            Regime::FullAuto => "full-auto",
            Regime::HighAuto => "high-auto",
            Regime::MultiStation => "multi-station",
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// PROCESS TAXONOMY
// =============================================================================

/// Stable process taxonomy shared between the planner and the supplier
/// competency analyzer. Model output is clamped onto this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Process {
    ColdForming,
    HotForging,
    Turning,
    Milling,
    ThreadRolling,
    Stamping,
    DeepDrawing,
    Grinding,
    HeatTreatment,
    SurfaceCoating,
    InjectionMolding,
    Assembly,
}

impl Process {
    pub const ALL: &'static [Process] = &[
        Process::ColdForming,
        Process::HotForging,
        Process::Turning,
        Process::Milling,
        Process::ThreadRolling,
        Process::Stamping,
        Process::DeepDrawing,
        Process::Grinding,
        Process::HeatTreatment,
        Process::SurfaceCoating,
        Process::InjectionMolding,
        Process::Assembly,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Process::ColdForming => "cold_forming",
            Process::HotForging => "hot_forging",
            Process::Turning => "turning",
            Process::Milling => "milling",
            Process::ThreadRolling => "thread_rolling",
            Process::Stamping => "stamping",
            Process::DeepDrawing => "deep_drawing",
            Process::Grinding => "grinding",
            Process::HeatTreatment => "heat_treatment",
            Process::SurfaceCoating => "surface_coating",
            Process::InjectionMolding => "injection_molding",
            Process::Assembly => "assembly",
        }
    }

    /// Parse a model-supplied label, tolerating common synonyms and the
    /// German shop-floor terms that show up in article histories.
    pub fn from_label(label: &str) -> Option<Self> {
        let norm = label.trim().to_lowercase().replace([' ', '-'], "_");
        match norm.as_str() {
            "cold_forming" | "cold_heading" | "kaltumformung" => Some(Process::ColdForming),
            "hot_forging" | "forging" | "warmumformung" => Some(Process::HotForging),
            "turning" | "cnc_turning" | "drehen" => Some(Process::Turning),
            "milling" | "cnc_milling" | "fraesen" => Some(Process::Milling),
            "thread_rolling" | "gewinderollen" | "thread_forming" => Some(Process::ThreadRolling),
            "stamping" | "punching" | "stanzen" => Some(Process::Stamping),
            "deep_drawing" | "tiefziehen" => Some(Process::DeepDrawing),
            "grinding" | "schleifen" => Some(Process::Grinding),
            "heat_treatment" | "hardening" | "haerten" => Some(Process::HeatTreatment),
            "surface_coating" | "coating" | "plating" | "galvanizing" | "verzinken" => {
                Some(Process::SurfaceCoating)
            }
            "injection_molding" | "spritzguss" => Some(Process::InjectionMolding),
            "assembly" | "montage" => Some(Process::Assembly),
            _ => None,
        }
    }
}

impl std::fmt::Display for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// PLAN RECORDS
// =============================================================================

/// Step-1 output: the identified route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteIdentification {
    /// Model's primary process label, verbatim.
    pub primary_process: String,
    /// Clamped taxonomy entry, when the label maps onto it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<Process>,
    pub secondary_processes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_compatibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_fit: Option<String>,
    pub expected_cycle_time_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_time_justification: Option<String>,
}

/// Primary process parameters of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStep {
    pub name: String,
    pub setup_time_min: f64,
    pub cycle_time_s: f64,
    pub machine_eur_h: f64,
    pub labor_eur_h: f64,
    /// Overhead as a fraction (0.20 = 20 %).
    pub overhead_pct: f64,
}

/// Secondary operation: same shape as the primary, without setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryOp {
    pub name: String,
    pub cycle_time_s: f64,
    pub machine_eur_h: f64,
    pub labor_eur_h: f64,
    pub overhead_pct: f64,
}

/// Deterministically recomputed cost breakdown, €/unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub variable_eur: f64,
    pub variable_with_overhead_eur: f64,
    pub setup_per_unit_eur: f64,
    pub secondary_sum_eur: f64,
    pub fab_per_unit_eur: f64,
}

/// The assembled fabrication plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricationPlan {
    pub regime: Regime,
    pub primary: ProcessStep,
    pub secondary_ops: Vec<SecondaryOp>,
    pub route_narrative: Vec<String>,
    /// Set when the chosen primary process is flagged unsuitable for the
    /// supplier; the negotiation planner consumes this.
    pub supplier_mismatch: bool,
    /// Set when the recomputed cost breached the regime ceiling.
    pub infeasible: bool,
    /// Model-supplied reason for a cycle time above the regime budget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

/// Planner output: plan, recomputed cost and provenance.
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub plan: FabricationPlan,
    pub breakdown: CostBreakdown,
    pub confidence: Confidence,
    pub assumptions: Vec<String>,
    pub trace: Vec<String>,
    pub tokens_used: usize,
}

impl PlanResult {
    /// Strict variant for callers that treat a ceiling breach as a refusal
    /// rather than a degraded plan.
    pub fn require_feasible(self) -> Result<PlanResult> {
        if self.plan.infeasible {
            return Err(SwageError::PlanInfeasible(format!(
                "{:.4} EUR/unit exceeds the {} regime ceiling",
                self.breakdown.fab_per_unit_eur, self.plan.regime
            )));
        }
        Ok(self)
    }
}

// =============================================================================
// COST ARITHMETIC
// =============================================================================

/// Recompute the cost equations from plan parameters.
///
/// ```text
/// var            = cycle_s × (machine + labor) / 3600
/// var_with_oh    = var × (1 + overhead)
/// setup_per_unit = (setup_min/60 × (machine + labor)) / lot_size
/// secondary_sum  = Σ cycle_s × (machine + labor) / 3600 × (1 + overhead)
/// fab_per_unit   = var_with_oh + setup_per_unit + secondary_sum
/// ```
pub fn recompute_cost(
    lot_size: u64,
    primary: &ProcessStep,
    secondary_ops: &[SecondaryOp],
) -> CostBreakdown {
    let lot = lot_size.max(1) as f64;
    let rate = primary.machine_eur_h + primary.labor_eur_h;
    let variable_eur = primary.cycle_time_s * rate / 3600.0;
    let variable_with_overhead_eur = variable_eur * (1.0 + primary.overhead_pct);
    let setup_per_unit_eur = (primary.setup_time_min / 60.0 * rate) / lot;
    let secondary_sum_eur: f64 = secondary_ops
        .iter()
        .map(|op| {
            op.cycle_time_s * (op.machine_eur_h + op.labor_eur_h) / 3600.0
                * (1.0 + op.overhead_pct)
        })
        .sum();

    CostBreakdown {
        variable_eur,
        variable_with_overhead_eur,
        setup_per_unit_eur,
        secondary_sum_eur,
        fab_per_unit_eur: variable_with_overhead_eur + setup_per_unit_eur + secondary_sum_eur,
    }
}

// =============================================================================
// PLANNER
// =============================================================================

/// Planner configuration, derived from the orchestrator config.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Model for both planning calls (typically the fast model).
    pub model: String,
    pub temperature: f64,
    pub max_tokens: usize,
    /// Fab-cost ceiling €/unit at lot ≥ 100 000 (calibration parameter).
    pub ceiling_high_auto: f64,
    /// Fab-cost ceiling €/unit at lot ≥ 300 000 (calibration parameter).
    pub ceiling_multi_station: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-20241022".to_string(),
            temperature: 0.1,
            max_tokens: 2048,
            ceiling_high_auto: 0.080,
            ceiling_multi_station: 0.050,
        }
    }
}

/// Heuristic fallback route when step 1 fails: single-spindle turning.
const FALLBACK_CYCLE_S: f64 = 6.0;
const FALLBACK_MACHINE_EUR_H: f64 = 80.0;
const FALLBACK_LABOR_EUR_H: f64 = 30.0;
const FALLBACK_OVERHEAD: f64 = 0.20;
const FALLBACK_SETUP_MIN: f64 = 30.0;

/// Maximum primary cycle time at lot ≥ 100 000 without a justification.
const HIGH_VOLUME_CYCLE_CAP_S: f64 = 1.0;

/// Two-step fabrication planner.
pub struct ProcessPlanner {
    gateway: LlmGateway,
    config: PlannerConfig,
}

impl ProcessPlanner {
    pub fn new(gateway: LlmGateway, config: PlannerConfig) -> Self {
        Self { gateway, config }
    }

    /// Ceiling for a regime, if one applies.
    fn ceiling_for(&self, regime: Regime) -> Option<f64> {
        match regime {
            Regime::HighAuto => Some(self.config.ceiling_high_auto),
            Regime::MultiStation => Some(self.config.ceiling_multi_station),
            _ => None,
        }
    }

    /// Produce a fabrication plan for a part at a given lot size.
    ///
    /// `mass_kg` is the post-override mass from the estimator; it feeds the
    /// prompts only. Never fails: model failures degrade to the heuristic
    /// route with `confidence = low`.
    pub fn plan(
        &self,
        part: &NormalizedPart,
        lot_size: u64,
        mass_kg: Option<f64>,
        competencies: Option<&CompetencyProfile>,
    ) -> PlanResult {
        let regime = Regime::from_lot_size(lot_size);
        let mut assumptions = Vec::new();
        let mut trace = vec![format!(
            "regime: {} (lot size {}), cycle budget {:.1}-{:.1} s",
            regime,
            lot_size,
            regime.cycle_band_s().0,
            regime.cycle_band_s().1
        )];
        let mut confidence = Confidence::High;
        let mut tokens_used = 0;

        // Step 1: route identification.
        let route = match self.identify_route(part, lot_size, mass_kg, regime, competencies) {
            RouteStep::Ok {
                route,
                tokens,
                degraded,
            } => {
                tokens_used += tokens;
                if degraded {
                    confidence = confidence.min_with(Confidence::Low);
                }
                trace.push(format!(
                    "route: {} + [{}], expected cycle {:.2} s",
                    route.primary_process,
                    route.secondary_processes.join(", "),
                    route.expected_cycle_time_s
                ));
                route
            }
            RouteStep::Failed(reason) => {
                assumptions.push(format!(
                    "route identification failed ({}); heuristic turning route assumed",
                    reason
                ));
                return self.fallback_plan(lot_size, regime, assumptions, trace, tokens_used);
            }
        };

        // Supplier steering outcome: a mismatch does not stop costing.
        let supplier_mismatch = competencies
            .zip(route.primary)
            .map(|(profile, primary)| profile.unsuitable_processes.contains(&primary))
            .unwrap_or(false);
        if supplier_mismatch {
            assumptions.push(format!(
                "primary process '{}' is flagged unsuitable for this supplier",
                route.primary_process
            ));
        }

        // Step 2: detailed costing.
        let (mut primary, secondary_ops, route_narrative, model_total) =
            match self.detail_costing(&route, regime, lot_size) {
                CostingStep::Ok {
                    primary,
                    secondary_ops,
                    route_narrative,
                    model_total,
                    tokens,
                    degraded,
                } => {
                    tokens_used += tokens;
                    if degraded {
                        confidence = confidence.min_with(Confidence::Low);
                    }
                    (primary, secondary_ops, route_narrative, model_total)
                }
                CostingStep::Failed(reason) => {
                    // Deterministic costing from step-1 parameters.
                    assumptions.push(format!(
                        "detailed costing failed ({}); cost derived from route parameters",
                        reason
                    ));
                    confidence = confidence.min_with(Confidence::Low);
                    (
                        ProcessStep {
                            name: route.primary_process.clone(),
                            setup_time_min: FALLBACK_SETUP_MIN,
                            cycle_time_s: route.expected_cycle_time_s,
                            machine_eur_h: FALLBACK_MACHINE_EUR_H,
                            labor_eur_h: FALLBACK_LABOR_EUR_H,
                            overhead_pct: FALLBACK_OVERHEAD,
                        },
                        Vec::new(),
                        vec![format!("{} (derived)", route.primary_process)],
                        None,
                    )
                }
            };

        // High-volume cycle budget: ≤ 1.0 s at lot ≥ 100 000 unless the
        // model justified the excess.
        let mut justification = route.cycle_time_justification.clone();
        if regime >= Regime::HighAuto && primary.cycle_time_s > HIGH_VOLUME_CYCLE_CAP_S {
            if justification.is_none() {
                assumptions.push(format!(
                    "primary cycle {:.2} s above the {:.1} s high-volume budget; clamped",
                    primary.cycle_time_s, HIGH_VOLUME_CYCLE_CAP_S
                ));
                primary.cycle_time_s = HIGH_VOLUME_CYCLE_CAP_S;
            } else {
                assumptions.push(format!(
                    "primary cycle {:.2} s above budget, justified by model",
                    primary.cycle_time_s
                ));
            }
        } else {
            justification = None;
        }

        // Recompute the equations and replace the model's stated total.
        let breakdown = recompute_cost(lot_size, &primary, &secondary_ops);
        trace.push(format!(
            "fab cost: var {:.4} + oh -> {:.4}, setup/unit {:.4}, secondary {:.4} = {:.4} EUR/unit",
            breakdown.variable_eur,
            breakdown.variable_with_overhead_eur,
            breakdown.setup_per_unit_eur,
            breakdown.secondary_sum_eur,
            breakdown.fab_per_unit_eur
        ));
        if let Some(stated) = model_total {
            let diff = relative_difference(stated, breakdown.fab_per_unit_eur);
            if diff > 0.01 {
                assumptions.push(format!(
                    "model total {:.4} EUR/unit deviated {:.1}% from recomputed {:.4}; recomputed value used",
                    stated,
                    diff * 100.0,
                    breakdown.fab_per_unit_eur
                ));
            }
        }

        // Regime ceiling.
        let mut infeasible = false;
        if let Some(ceiling) = self.ceiling_for(regime) {
            if breakdown.fab_per_unit_eur > ceiling {
                infeasible = true;
                confidence = Confidence::Low;
                assumptions.push(format!(
                    "plan infeasible: {:.4} EUR/unit exceeds the {:.3} EUR/unit {} ceiling (model numbers unreconciled)",
                    breakdown.fab_per_unit_eur,
                    ceiling,
                    regime
                ));
            }
        }

        PlanResult {
            plan: FabricationPlan {
                regime,
                primary,
                secondary_ops,
                route_narrative,
                supplier_mismatch,
                infeasible,
                justification,
            },
            breakdown,
            confidence,
            assumptions,
            trace,
            tokens_used,
        }
    }

    /// Step 1: identify the route.
    fn identify_route(
        &self,
        part: &NormalizedPart,
        lot_size: u64,
        mass_kg: Option<f64>,
        regime: Regime,
        competencies: Option<&CompetencyProfile>,
    ) -> RouteStep {
        let ceiling = self.ceiling_for(regime);
        let request = LlmRequest::new(
            &self.config.model,
            prompts::route_system_prompt(regime, ceiling),
            prompts::route_prompt(part, lot_size, mass_kg, regime, competencies),
        )
        .with_max_tokens(self.config.max_tokens)
        .with_temperature(self.config.temperature);

        let schema = SchemaSpec::new()
            .require("primary_process")
            .numeric("expected_cycle_time_seconds");

        match self.gateway.call(&request, &schema) {
            LlmOutcome::Parsed {
                value,
                tokens_used,
                violations,
                ..
            } => {
                let primary_process = match str_field(&value, "primary_process") {
                    Some(p) => p,
                    None => return RouteStep::Failed("no primary process in response".to_string()),
                };
                let (band_lo, band_hi) = regime.cycle_band_s();
                let expected_cycle_time_s = num_field(&value, "expected_cycle_time_seconds")
                    .unwrap_or((band_lo + band_hi) / 2.0);
                let route = RouteIdentification {
                    primary: Process::from_label(&primary_process),
                    primary_process,
                    secondary_processes: str_list(&value, "secondary_processes"),
                    material_compatibility: str_field(&value, "material_compatibility"),
                    supplier_fit: str_field(&value, "supplier_fit"),
                    expected_cycle_time_s,
                    cycle_time_justification: str_field(&value, "cycle_time_justification"),
                };
                RouteStep::Ok {
                    route,
                    tokens: tokens_used,
                    degraded: !violations.is_empty(),
                }
            }
            LlmOutcome::ParseFallback { reason, .. } => RouteStep::Failed(reason),
            LlmOutcome::ApiError { detail, .. } => RouteStep::Failed(detail),
        }
    }

    /// Step 2: detailed costing from the identified route.
    fn detail_costing(&self, route: &RouteIdentification, regime: Regime, lot_size: u64) -> CostingStep {
        let request = LlmRequest::new(
            &self.config.model,
            prompts::costing_system_prompt(),
            prompts::costing_prompt(route, regime, lot_size),
        )
        .with_max_tokens(self.config.max_tokens)
        .with_temperature(self.config.temperature);

        let schema = SchemaSpec::new()
            .require("primary")
            .numeric_optional("fab_cost_eur_per_unit");

        match self.gateway.call(&request, &schema) {
            LlmOutcome::Parsed {
                value,
                tokens_used,
                violations,
                ..
            } => {
                let primary_value = match value.get("primary") {
                    Some(p) if p.is_object() => p,
                    _ => return CostingStep::Failed("no primary block in response".to_string()),
                };
                let primary = parse_primary(primary_value, route);
                let secondary_ops = value
                    .get("secondary_ops")
                    .and_then(|v| v.as_array())
                    .map(|ops| ops.iter().filter_map(parse_secondary).collect())
                    .unwrap_or_default();
                let route_narrative = {
                    let narrative = str_list(&value, "route_narrative");
                    if narrative.is_empty() {
                        std::iter::once(route.primary_process.clone())
                            .chain(route.secondary_processes.iter().cloned())
                            .collect()
                    } else {
                        narrative
                    }
                };
                CostingStep::Ok {
                    primary,
                    secondary_ops,
                    route_narrative,
                    model_total: num_field(&value, "fab_cost_eur_per_unit"),
                    tokens: tokens_used,
                    degraded: !violations.is_empty(),
                }
            }
            LlmOutcome::ParseFallback { reason, .. } => CostingStep::Failed(reason),
            LlmOutcome::ApiError { detail, .. } => CostingStep::Failed(detail),
        }
    }

    /// Deterministic heuristic plan when route identification fails.
    fn fallback_plan(
        &self,
        lot_size: u64,
        regime: Regime,
        mut assumptions: Vec<String>,
        mut trace: Vec<String>,
        tokens_used: usize,
    ) -> PlanResult {
        let primary = ProcessStep {
            name: "turning".to_string(),
            setup_time_min: FALLBACK_SETUP_MIN,
            cycle_time_s: FALLBACK_CYCLE_S,
            machine_eur_h: FALLBACK_MACHINE_EUR_H,
            labor_eur_h: FALLBACK_LABOR_EUR_H,
            overhead_pct: FALLBACK_OVERHEAD,
        };
        let breakdown = recompute_cost(lot_size, &primary, &[]);
        trace.push(format!(
            "heuristic fab cost: {:.4} EUR/unit",
            breakdown.fab_per_unit_eur
        ));

        let mut infeasible = false;
        if let Some(ceiling) = self.ceiling_for(regime) {
            if breakdown.fab_per_unit_eur > ceiling {
                infeasible = true;
                assumptions.push(format!(
                    "heuristic plan exceeds the {:.3} EUR/unit {} ceiling",
                    ceiling, regime
                ));
            }
        }

        PlanResult {
            plan: FabricationPlan {
                regime,
                primary,
                secondary_ops: Vec::new(),
                route_narrative: vec!["turning (heuristic default)".to_string()],
                supplier_mismatch: false,
                infeasible,
                justification: None,
            },
            breakdown,
            confidence: Confidence::Low,
            assumptions,
            trace,
            tokens_used,
        }
    }
}

enum RouteStep {
    Ok {
        route: RouteIdentification,
        tokens: usize,
        degraded: bool,
    },
    Failed(String),
}

enum CostingStep {
    Ok {
        primary: ProcessStep,
        secondary_ops: Vec<SecondaryOp>,
        route_narrative: Vec<String>,
        model_total: Option<f64>,
        tokens: usize,
        degraded: bool,
    },
    Failed(String),
}

fn parse_primary(value: &serde_json::Value, route: &RouteIdentification) -> ProcessStep {
    ProcessStep {
        name: str_field(value, "name").unwrap_or_else(|| route.primary_process.clone()),
        setup_time_min: num_field(value, "setup_time_min").unwrap_or(FALLBACK_SETUP_MIN),
        cycle_time_s: num_field(value, "cycle_time_s").unwrap_or(route.expected_cycle_time_s),
        machine_eur_h: num_field(value, "machine_eur_h").unwrap_or(FALLBACK_MACHINE_EUR_H),
        labor_eur_h: num_field(value, "labor_eur_h").unwrap_or(FALLBACK_LABOR_EUR_H),
        overhead_pct: normalize_overhead(num_field(value, "overhead_pct")),
    }
}

fn parse_secondary(value: &serde_json::Value) -> Option<SecondaryOp> {
    Some(SecondaryOp {
        name: str_field(value, "name")?,
        cycle_time_s: num_field(value, "cycle_time_s")?,
        machine_eur_h: num_field(value, "machine_eur_h").unwrap_or(FALLBACK_MACHINE_EUR_H),
        labor_eur_h: num_field(value, "labor_eur_h").unwrap_or(FALLBACK_LABOR_EUR_H),
        overhead_pct: normalize_overhead(num_field(value, "overhead_pct")),
    })
}

/// Models emit overhead both as a fraction (0.2) and as percent (20).
fn normalize_overhead(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v > 1.5 => v / 100.0,
        Some(v) if v >= 0.0 => v,
        _ => FALLBACK_OVERHEAD,
    }
}

fn relative_difference(a: f64, b: f64) -> f64 {
    if b.abs() < f64::EPSILON {
        return if a.abs() < f64::EPSILON { 0.0 } else { 1.0 };
    }
    ((a - b) / b).abs()
}
