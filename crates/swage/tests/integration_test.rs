//! End-to-end estimation scenarios over a scripted model transport.

use std::sync::Arc;

use serde_json::json;

use swage::commodity::{CommodityFeed, CommodityPoint};
use swage::error::Result as SwageResult;
use swage::llm::mock::MockTransport;
use swage::supplier::CapabilityLevel;
use swage::{
    Confidence, EstimateRequest, Material, PartFamily, Process, Regime, Swage, SwageConfig,
    SwageError, SupplierProfile,
};

fn engine(transport: Arc<MockTransport>) -> Swage {
    let config = SwageConfig::default().with_commodity_enabled(false);
    Swage::with_transport(config, transport).expect("engine construction")
}

fn push_route(transport: &MockTransport, process: &str, cycle_s: f64) {
    transport.push_json(json!({
        "primary_process": process,
        "secondary_processes": ["thread_rolling"],
        "material_compatibility": "suited",
        "expected_cycle_time_seconds": cycle_s
    }));
}

fn push_costing(
    transport: &MockTransport,
    process: &str,
    cycle_s: f64,
    machine: f64,
    labor: f64,
    overhead: f64,
    setup_min: f64,
    stated_total: f64,
) {
    transport.push_json(json!({
        "primary": {
            "name": process,
            "setup_time_min": setup_min,
            "cycle_time_s": cycle_s,
            "machine_eur_h": machine,
            "labor_eur_h": labor,
            "overhead_pct": overhead
        },
        "secondary_ops": [],
        "route_narrative": [process, "thread_rolling"],
        "fab_cost_eur_per_unit": stated_total
    }));
}

// =============================================================================
// Scenario Tests
// =============================================================================

#[test]
fn test_coated_set_screw_full_estimate() {
    let transport = Arc::new(MockTransport::new());
    transport.push_json(json!({
        "material": "steel",
        "mass_kg_per_unit": 0.0277,
        "material_price_eur_per_kg": 1.25,
        "step_by_step": ["volume = pi * 5^2 * 45 = 3534.29 mm^3", "mass = 27.74 g"]
    }));
    push_route(&transport, "cold_forming", 3.0);
    push_costing(&transport, "cold_forming", 3.0, 120.0, 40.0, 0.15, 30.0, 0.16);

    let estimate = engine(transport)
        .estimate(&EstimateRequest::new(
            "ISO 4028-10.9-(ZN-NI)-M10×1,25×45",
            11_815,
        ))
        .unwrap();

    assert_eq!(estimate.material, Material::Steel);
    assert_eq!(estimate.family, PartFamily::SetScrew);
    assert_eq!(estimate.geometry.diameter_mm, Some(10.0));
    assert_eq!(estimate.geometry.length_mm, Some(45.0));
    assert_eq!(
        estimate.material_details.surface_treatment.as_deref(),
        Some("ZN-NI")
    );
    assert_eq!(
        estimate.material_details.strength_class.as_deref(),
        Some("10.9")
    );

    let mass = estimate.mass_kg.unwrap();
    assert!((mass - 0.0277).abs() / 0.0277 < 0.05, "mass = {mass}");
    assert!((1.2..=1.5).contains(&estimate.material_price_eur_per_kg));

    let fab = estimate.fab_cost_eur_per_unit.unwrap();
    assert!((0.12..=0.20).contains(&fab), "fab = {fab}");
    assert!(estimate.confidence >= Confidence::Medium);
    assert!(estimate
        .assumptions
        .iter()
        .any(|a| a.contains("cylindrical approximation")));
}

#[test]
fn test_stainless_nut_uses_nut_factor_and_stainless_co2() {
    let transport = Arc::new(MockTransport::new());
    transport.push_json(json!({
        "material": "stainless_a2",
        "mass_kg_per_unit": 0.0076,
        "material_price_eur_per_kg": 3.1
    }));
    push_route(&transport, "cold_forming", 2.5);
    push_costing(&transport, "cold_forming", 2.5, 100.0, 35.0, 0.2, 30.0, 0.12);

    let estimate = engine(transport)
        .estimate(&EstimateRequest::new("DIN934-A2-70-M10", 5_000))
        .unwrap();

    assert_eq!(estimate.material, Material::StainlessA2);
    assert_eq!(estimate.family, PartFamily::Nut);
    assert!((2.8..=3.4).contains(&estimate.material_price_eur_per_kg));

    // Nut model: outer cylinder reduced by the core-hole factor, derived
    // from the diameter alone.
    let mass = estimate.mass_kg.unwrap();
    assert!((mass - 0.00763).abs() < 0.0008, "mass = {mass}");

    let co2 = estimate.co2.unwrap();
    assert!((co2.production_kg - mass * 3.1).abs() < 1e-9);
}

#[test]
fn test_coating_code_never_reads_as_stainless() {
    let transport = Arc::new(MockTransport::new());
    // The model falls for the (A2K) trap; the rule chain must not.
    transport.push_json(json!({
        "material": "stainless_a2",
        "mass_kg_per_unit": 0.012,
        "material_price_eur_per_kg": 3.0
    }));
    push_route(&transport, "cold_forming", 3.0);
    push_costing(&transport, "cold_forming", 3.0, 100.0, 35.0, 0.2, 30.0, 0.14);

    let estimate = engine(transport)
        .estimate(&EstimateRequest::new("DIN933-ST-(A2K)-M8×25", 1_000))
        .unwrap();

    assert_eq!(estimate.material, Material::Steel);
    assert_eq!(
        estimate.material_details.surface_treatment.as_deref(),
        Some("A2K")
    );
}

#[test]
fn test_high_volume_regime_and_ceiling() {
    let transport = Arc::new(MockTransport::new());
    transport.push_json(json!({
        "material": "steel",
        "mass_kg_per_unit": 0.0066,
        "material_price_eur_per_kg": 1.1
    }));
    push_route(&transport, "cold_forming", 0.6);
    push_costing(&transport, "cold_forming", 0.6, 200.0, 40.0, 0.2, 60.0, 0.0483);

    let estimate = engine(transport)
        .estimate(&EstimateRequest::new("M6×30 8.8 verzinkt", 842_987))
        .unwrap();

    let plan = estimate.fabrication.unwrap();
    assert_eq!(plan.regime, Regime::MultiStation);
    assert!(plan.primary.cycle_time_s <= 1.0);
    assert!(!plan.infeasible);

    let fab = estimate.fab_cost_eur_per_unit.unwrap();
    assert!((0.025..=0.050).contains(&fab), "fab = {fab}");
    assert_eq!(
        estimate.material_details.surface_treatment.as_deref(),
        Some("VZ")
    );
}

#[test]
fn test_aluminum_flange_from_china() {
    let transport = Arc::new(MockTransport::new());
    transport.push_json(json!({
        "material": "aluminum",
        "mass_kg_per_unit": 0.068,
        "material_price_eur_per_kg": 2.5
    }));
    push_route(&transport, "turning", 8.0);
    push_costing(&transport, "turning", 8.0, 80.0, 35.0, 0.2, 30.0, 0.31);

    let estimate = engine(transport)
        .estimate(&EstimateRequest::new("AlMg3-Flansch Ø40 L20", 800).with_country("CN"))
        .unwrap();

    assert_eq!(estimate.material, Material::Aluminum);
    let co2 = estimate.co2.unwrap();
    assert_eq!(co2.transport_mode, swage::TransportMode::Ship);
    assert!(!co2.is_eu_source);
    assert!(co2.cbam_cost_eur > 0.0);
    assert!((co2.production_kg - estimate.mass_kg.unwrap() * 8.2).abs() < 1e-9);
}

#[test]
fn test_supplier_history_steers_the_route() {
    let transport = Arc::new(MockTransport::new());
    transport.push_json(json!({
        "material": "steel",
        "mass_kg_per_unit": 0.013,
        "material_price_eur_per_kg": 1.2
    }));
    // Competency analysis.
    transport.push_json(json!({
        "core_competencies": [
            {"process": "cold_forming", "capability_level": "expert",
             "confidence": "high", "evidence": ["40 DIN933/DIN934 articles"]}
        ],
        "material_expertise": ["steel"],
        "unsuitable_processes": [],
        "preferred_lot_sizes": ["10k-100k"]
    }));
    push_route(&transport, "cold_forming", 2.0);
    push_costing(&transport, "cold_forming", 2.0, 120.0, 35.0, 0.2, 45.0, 0.11);
    // Rating and negotiation.
    transport.push_json(json!({
        "rating": 8,
        "risk_level": "low",
        "article_fit": "strong fastener history",
        "strengths": ["cold forming"],
        "weaknesses": []
    }));
    transport.push_json(json!({
        "strategy_overview": "Anchor on the cost breakdown.",
        "objectives": {"primary_goal": "5% reduction", "batna": "second source"},
        "opening_statement": "Let us review the numbers.",
        "closing_statement": "We confirm by Friday."
    }));

    let supplier = SupplierProfile {
        name: "Muster GmbH".to_string(),
        country: "DE".to_string(),
        article_history: (0..40)
            .map(|i| {
                if i % 2 == 0 {
                    format!("DIN933 M{}×25 8.8", 6 + i % 6)
                } else {
                    format!("DIN934-A2-70-M{}", 6 + i % 6)
                }
            })
            .collect(),
        price_history_eur: vec![0.09, 0.095, 0.10],
    };

    let estimate = engine(transport.clone())
        .estimate(&EstimateRequest::new("DIN933 M8×25", 20_000).with_supplier(supplier))
        .unwrap();

    let competencies = estimate.competencies.unwrap();
    let cold_forming = competencies
        .core_competencies
        .iter()
        .find(|c| c.process == Process::ColdForming)
        .expect("cold forming competency");
    assert!(cold_forming.capability_level >= CapabilityLevel::Proficient);

    // The route prompt carried the capability profile.
    let requests = transport.requests_seen();
    let route_request = &requests[2];
    assert!(route_request.user.contains("cold_forming (expert"));

    assert!(estimate.rating.is_some());
    assert!(estimate.negotiation.is_some());
}

#[test]
fn test_out_of_set_risk_level_drops_confidence() {
    let transport = Arc::new(MockTransport::new());
    transport.push_json(json!({
        "material": "steel",
        "mass_kg_per_unit": 0.0277,
        "material_price_eur_per_kg": 1.25
    }));
    push_route(&transport, "cold_forming", 3.0);
    push_costing(&transport, "cold_forming", 3.0, 120.0, 40.0, 0.15, 30.0, 0.16);
    // "catastrophic" validates as JSON but is outside the risk enum.
    transport.push_json(json!({
        "rating": 3,
        "risk_level": "catastrophic",
        "weaknesses": ["export license history"]
    }));
    transport.push_json(json!({
        "strategy_overview": "Tread carefully.",
        "opening_statement": "We need to talk about risk.",
        "closing_statement": "We will follow up in writing."
    }));

    let supplier = SupplierProfile {
        name: "Muster GmbH".to_string(),
        country: "DE".to_string(),
        article_history: Vec::new(),
        price_history_eur: Vec::new(),
    };

    let estimate = engine(transport)
        .estimate(
            &EstimateRequest::new("ISO 4028 M10×45", 11_815).with_supplier(supplier),
        )
        .unwrap();

    // The value is clamped onto the enum and the estimate drops to low.
    let rating = estimate.rating.unwrap();
    assert_eq!(rating.risk_level, swage::RiskLevel::Medium);
    assert_eq!(estimate.confidence, Confidence::Low);
    assert!(estimate
        .assumptions
        .iter()
        .any(|a| a.contains("rating response violated its schema")));
}

// =============================================================================
// Degradation Tests
// =============================================================================

struct FailingFeed;

impl CommodityFeed for FailingFeed {
    fn price_for(&self, _material: Material, _horizon_days: u32) -> SwageResult<CommodityPoint> {
        Err(SwageError::Commodity("socket closed".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[test]
fn test_commodity_outage_never_fails_the_estimate() {
    let transport = Arc::new(MockTransport::new());
    transport.push_json(json!({
        "material": "steel",
        "mass_kg_per_unit": 0.0277,
        "material_price_eur_per_kg": 1.3
    }));
    push_route(&transport, "cold_forming", 3.0);
    push_costing(&transport, "cold_forming", 3.0, 120.0, 40.0, 0.15, 30.0, 0.16);

    let swage = Swage::with_transport(SwageConfig::default(), transport)
        .unwrap()
        .with_commodity_feed(Arc::new(FailingFeed));

    let estimate = swage
        .estimate(&EstimateRequest::new("ISO 4028 M10×45", 11_815))
        .unwrap();

    // The estimator's price survives the outage.
    assert!((estimate.material_price_eur_per_kg - 1.3).abs() < 1e-9);
    assert!(estimate
        .assumptions
        .iter()
        .any(|a| a.contains("commodity feed unavailable")));
}

#[test]
fn test_every_model_call_failing_still_produces_an_estimate() {
    let transport = Arc::new(MockTransport::new());
    // The mock transport reports exhaustion as a transient API error for
    // every call, so nothing needs scripting.
    let estimate = engine(transport)
        .estimate(&EstimateRequest::new("ISO 4028 M10×45", 11_815))
        .unwrap();

    assert_eq!(estimate.confidence, Confidence::Low);
    // Deterministic pipeline still produced numbers.
    assert!(estimate.mass_kg.is_some());
    assert!(estimate.fab_cost_eur_per_unit.is_some());
    assert_eq!(estimate.fabrication.unwrap().primary.name, "turning");
}

#[test]
fn test_estimate_serializes_to_json() {
    let transport = Arc::new(MockTransport::new());
    transport.push_json(json!({
        "material": "steel",
        "mass_kg_per_unit": 0.0277,
        "material_price_eur_per_kg": 1.2
    }));
    push_route(&transport, "cold_forming", 3.0);
    push_costing(&transport, "cold_forming", 3.0, 120.0, 40.0, 0.15, 30.0, 0.16);

    let estimate = engine(transport)
        .estimate(&EstimateRequest::new("ISO 4028 M10×45", 11_815))
        .unwrap();

    let text = serde_json::to_string_pretty(&estimate).unwrap();
    let back: swage::PartEstimate = serde_json::from_str(&text).unwrap();
    assert_eq!(back.material, estimate.material);
    assert_eq!(back.lot_size, estimate.lot_size);
    assert_eq!(back.assumptions, estimate.assumptions);
}
