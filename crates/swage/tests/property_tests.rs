//! Property-based tests for the deterministic kernels.
//!
//! The normalizers, the physics kernel and the cost arithmetic must never
//! panic, must stay within their documented ranges, and must be
//! deterministic; proptest hammers them with arbitrary input.

use proptest::prelude::*;

use swage::commodity::Trend;
use swage::normalize::{normalize, parse_dimensions};
use swage::physics::{family_mass_kg, volume_cylinder_mm3};
use swage::planner::{recompute_cost, ProcessStep, Regime};
use swage::{Material, PartFamily};

// =============================================================================
// Strategies
// =============================================================================

fn arbitrary_description() -> impl Strategy<Value = String> {
    prop_oneof![
        // Norm-like tokens
        "(ISO|DIN)\\s?[0-9]{3,4}[\\-\\s]?M[0-9]{1,2}(×[0-9]{1,3})?",
        // Free German-ish text
        "[A-Za-zäöüß0-9\\-\\s\\(\\)×x\\.]{0,60}",
        // Pathological
        ".{0,40}",
    ]
}

fn any_material() -> impl Strategy<Value = Material> {
    prop::sample::select(Material::ALL.to_vec())
}

fn any_family() -> impl Strategy<Value = PartFamily> {
    prop::sample::select(vec![
        PartFamily::SetScrew,
        PartFamily::HexBolt,
        PartFamily::Nut,
        PartFamily::Washer,
        PartFamily::Cylinder,
    ])
}

// =============================================================================
// Normalizer Properties
// =============================================================================

proptest! {
    #[test]
    fn normalize_never_panics(description in arbitrary_description()) {
        let _ = normalize(&description, &[]);
    }

    #[test]
    fn normalize_is_deterministic(description in arbitrary_description()) {
        let a = normalize(&description, &[]);
        let b = normalize(&description, &[]);
        prop_assert_eq!(a.material, b.material);
        prop_assert_eq!(a.diameter_mm, b.diameter_mm);
        prop_assert_eq!(a.length_mm, b.length_mm);
        prop_assert_eq!(a.family, b.family);
    }

    #[test]
    fn parsed_dimensions_stay_clamped(description in arbitrary_description()) {
        let dims = parse_dimensions(&description);
        if let Some(d) = dims.diameter_mm {
            prop_assert!((1.0..=2000.0).contains(&d));
        }
        if let Some(l) = dims.length_mm {
            prop_assert!((1.0..=5000.0).contains(&l));
        }
    }

    #[test]
    fn parenthesized_codes_keep_steel_base(code in "[A-Z][A-Z0-9]{1,4}") {
        // Whatever sits inside parentheses, the base never turns stainless.
        let description = format!("ST-Schraube ({}) M8×20", code);
        let part = normalize(&description, &[]);
        prop_assert_eq!(part.material, Material::Steel);
    }
}

// =============================================================================
// Physics Properties
// =============================================================================

proptest! {
    #[test]
    fn mass_is_positive_for_valid_geometry(
        family in any_family(),
        material in any_material(),
        d in 1.0f64..2000.0,
        l in 1.0f64..5000.0,
    ) {
        let mass = family_mass_kg(family, material, Some(d), Some(l));
        prop_assert!(mass.unwrap() > 0.0);
    }

    #[test]
    fn cylinder_mass_is_monotonic_in_length(
        material in any_material(),
        d in 1.0f64..500.0,
        l in 1.0f64..2000.0,
    ) {
        let base = family_mass_kg(PartFamily::Cylinder, material, Some(d), Some(l)).unwrap();
        let longer = family_mass_kg(PartFamily::Cylinder, material, Some(d), Some(l * 2.0)).unwrap();
        prop_assert!(longer > base);
    }

    #[test]
    fn cylinder_volume_matches_reference(d in 1.0f64..500.0, l in 1.0f64..2000.0) {
        let v = volume_cylinder_mm3(d, l);
        let reference = std::f64::consts::PI * (d / 2.0).powi(2) * l;
        prop_assert!((v - reference).abs() / reference < 0.005);
    }
}

// =============================================================================
// Cost Arithmetic Properties
// =============================================================================

proptest! {
    #[test]
    fn fab_cost_is_sum_of_components(
        lot in 1u64..1_000_000,
        cycle in 0.1f64..30.0,
        machine in 10.0f64..500.0,
        labor in 5.0f64..100.0,
        overhead in 0.0f64..1.0,
        setup in 0.0f64..480.0,
    ) {
        let primary = ProcessStep {
            name: "turning".to_string(),
            setup_time_min: setup,
            cycle_time_s: cycle,
            machine_eur_h: machine,
            labor_eur_h: labor,
            overhead_pct: overhead,
        };
        let b = recompute_cost(lot, &primary, &[]);
        prop_assert!(b.fab_per_unit_eur > 0.0);
        let sum = b.variable_with_overhead_eur + b.setup_per_unit_eur + b.secondary_sum_eur;
        prop_assert!((b.fab_per_unit_eur - sum).abs() < 1e-12);
    }

    #[test]
    fn setup_share_shrinks_with_lot_size(
        lot in 1u64..500_000,
        cycle in 0.1f64..30.0,
        setup in 1.0f64..480.0,
    ) {
        let primary = ProcessStep {
            name: "turning".to_string(),
            setup_time_min: setup,
            cycle_time_s: cycle,
            machine_eur_h: 80.0,
            labor_eur_h: 30.0,
            overhead_pct: 0.2,
        };
        let small = recompute_cost(lot, &primary, &[]);
        let large = recompute_cost(lot * 10, &primary, &[]);
        prop_assert!(large.setup_per_unit_eur < small.setup_per_unit_eur);
        prop_assert!(large.fab_per_unit_eur <= small.fab_per_unit_eur);
    }

    #[test]
    fn regime_bands_cover_all_lot_sizes(lot in 1u64..10_000_000) {
        // Every lot size maps to exactly one regime with a sane cycle band.
        let regime = Regime::from_lot_size(lot);
        let (lo, hi) = regime.cycle_band_s();
        prop_assert!(lo > 0.0 && lo < hi);
    }
}

// =============================================================================
// Trend Classification Properties
// =============================================================================

proptest! {
    #[test]
    fn trend_classification_is_total_and_ordered(pct in -50.0f64..50.0) {
        let trend = Trend::classify(pct);
        if pct < -3.0 {
            prop_assert_eq!(trend, Trend::SteepDown);
        } else if pct > 3.0 {
            prop_assert_eq!(trend, Trend::SteepUp);
        } else if (-1.0..=1.0).contains(&pct) {
            prop_assert_eq!(trend, Trend::Stable);
        }
    }
}
