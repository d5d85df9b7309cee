//! Deterministic physics kernel: volume, mass, family adjustment factors.
//!
//! Everything here is pure arithmetic. The estimator uses these numbers to
//! cross-check (and where necessary override) model-supplied masses, so the
//! kernel must stay free of any stochastic input.

use crate::normalize::{Material, PartFamily};

/// Thread-root reduction factor for hex head bolt shafts.
const HEX_SHAFT_FACTOR: f64 = 0.85;

/// Head fill factor: a hex prism is ~85% of its circumscribing cylinder.
const HEX_HEAD_FILL: f64 = 0.85;

/// Width across flats as a multiple of nominal diameter.
const WAF_RATIO: f64 = 1.6;

/// Hex head height as a multiple of nominal diameter.
const HEAD_HEIGHT_RATIO: f64 = 0.65;

/// Nut height as a multiple of nominal diameter.
const NUT_HEIGHT_RATIO: f64 = 0.8;

/// Core-hole subtraction factor for nuts.
const NUT_CORE_FACTOR: f64 = 0.60;

/// Washer proportions per DIN 125: outer diameter 2×d, bore 1.1×d,
/// thickness 0.2×d.
const WASHER_OUTER_RATIO: f64 = 2.0;
const WASHER_BORE_RATIO: f64 = 1.1;
const WASHER_THICKNESS_RATIO: f64 = 0.2;

/// Volume of a cylinder in mm³.
pub fn volume_cylinder_mm3(d_mm: f64, l_mm: f64) -> f64 {
    std::f64::consts::PI * (d_mm / 2.0).powi(2) * l_mm
}

/// Convert a volume in mm³ to mass in kg for the given material.
pub fn mass_kg(volume_mm3: f64, material: Material) -> f64 {
    let volume_cm3 = volume_mm3 / 1000.0;
    volume_cm3 * material.density_g_cm3() / 1000.0
}

/// Mass of a part using the family-specific adjustment model.
///
/// Returns `None` when the geometry is insufficient: screws and cylinders
/// need diameter and length, nuts and washers derive their own proportions
/// from the diameter alone.
pub fn family_mass_kg(
    family: PartFamily,
    material: Material,
    d_mm: Option<f64>,
    l_mm: Option<f64>,
) -> Option<f64> {
    let d = d_mm?;
    let volume = match family {
        PartFamily::SetScrew => volume_cylinder_mm3(d, l_mm?),
        PartFamily::Cylinder => volume_cylinder_mm3(d, l_mm?),
        PartFamily::HexBolt => {
            let shaft = volume_cylinder_mm3(d, l_mm?) * HEX_SHAFT_FACTOR;
            let waf = WAF_RATIO * d;
            let head = (waf / 2.0).powi(2)
                * std::f64::consts::PI
                * (HEAD_HEIGHT_RATIO * d)
                * HEX_HEAD_FILL;
            shaft + head
        }
        PartFamily::Nut => {
            let waf = WAF_RATIO * d;
            volume_cylinder_mm3(waf, NUT_HEIGHT_RATIO * d) * NUT_CORE_FACTOR
        }
        PartFamily::Washer => {
            let outer = WASHER_OUTER_RATIO * d;
            let bore = WASHER_BORE_RATIO * d;
            let t = WASHER_THICKNESS_RATIO * d;
            std::f64::consts::FRAC_PI_4 * (outer.powi(2) - bore.powi(2)) * t
        }
    };
    Some(mass_kg(volume, material))
}

/// Human-readable description of the family model, for calculation traces.
pub fn family_model_note(family: PartFamily) -> &'static str {
    match family {
        PartFamily::SetScrew => "cylindrical approximation, factor 1.00 (headless)",
        PartFamily::HexBolt => "cylindrical approximation, shaft factor 0.85 plus hex head term",
        PartFamily::Nut => "cylindrical approximation, outer cylinder x 0.60 (core hole)",
        PartFamily::Washer => "annular ring, DIN 125 proportions",
        PartFamily::Cylinder => "cylindrical approximation, factor 1.00",
    }
}
