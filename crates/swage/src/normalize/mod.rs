//! Normalizers: turn a free-form part description into a structured record.
//!
//! Two deterministic passes run before any model call: the dimension parser
//! extracts diameter/length/pitch tokens, and the material classifier applies
//! an ordered rule chain over textual cues. Neither pass can fail; anything
//! unrecognized simply stays `None` or falls to the default material.

mod dimensions;
mod material;

pub use dimensions::{parse_dimensions, Dimensions, DIAMETER_RANGE_MM, LENGTH_RANGE_MM};
pub use material::{
    classify_material, detect_part_family, Material, MaterialClassification, PartFamily,
    DEFAULT_COATING_CODES,
};

use serde::{Deserialize, Serialize};

/// Fully normalized part record, the contract every downstream component
/// consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedPart {
    /// Original description, verbatim.
    pub raw: String,
    /// Base material after the rule chain (coatings never change this).
    pub material: Material,
    /// Parenthesized surface-treatment code, if any (e.g. `A2K`, `ZN-NI`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_treatment: Option<String>,
    /// Strength class token, if any (e.g. `8.8`, `10.9`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength_class: Option<String>,
    /// Part family inferred from norm identifiers and keywords.
    pub family: PartFamily,
    /// Nominal diameter in mm, clamped to [1, 2000].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diameter_mm: Option<f64>,
    /// Length in mm, clamped to [1, 5000].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_mm: Option<f64>,
    /// Thread pitch in mm when the token carries one (`M10×1,25×45`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_pitch_mm: Option<f64>,
}

/// Normalize a part description. Never fails: unknown tokens degrade to
/// `None` fields and the default material.
pub fn normalize(description: &str, extra_coating_codes: &[String]) -> NormalizedPart {
    let dims = parse_dimensions(description);
    let classification = classify_material(description, extra_coating_codes);
    let family = detect_part_family(description);

    NormalizedPart {
        raw: description.to_string(),
        material: classification.material,
        surface_treatment: classification.surface_treatment,
        strength_class: classification.strength_class,
        family,
        diameter_mm: dims.diameter_mm,
        length_mm: dims.length_mm,
        thread_pitch_mm: dims.pitch_mm,
    }
}
