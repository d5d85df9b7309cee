//! Material classification rule chain and part-family detection.
//!
//! The classifier walks an ordered rule list, first match wins. The one rule
//! that trips everyone up: surface-coating codes inside parentheses never
//! change the base material. `(A2K)` on a steel screw stays steel even though
//! `A2` alone would read as stainless.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Base material of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Steel,
    StainlessA2,
    StainlessA4,
    Aluminum,
    Brass,
    Copper,
    Zinc,
    Titanium,
    Plastic,
    CastIron,
}

impl Material {
    pub const ALL: &'static [Material] = &[
        Material::Steel,
        Material::StainlessA2,
        Material::StainlessA4,
        Material::Aluminum,
        Material::Brass,
        Material::Copper,
        Material::Zinc,
        Material::Titanium,
        Material::Plastic,
        Material::CastIron,
    ];

    /// Density in g/cm³.
    pub fn density_g_cm3(&self) -> f64 {
        match self {
            Material::Steel => 7.85,
            Material::StainlessA2 | Material::StainlessA4 => 7.90,
            Material::Aluminum => 2.70,
            Material::Brass => 8.50,
            Material::Copper => 8.96,
            Material::Zinc => 7.14,
            Material::Titanium => 4.51,
            Material::Plastic => 1.40,
            Material::CastIron => 7.20,
        }
    }

    /// Coarse family label used for commodity lookup and price bands.
    pub fn family(&self) -> &'static str {
        match self {
            Material::Steel => "steel",
            Material::StainlessA2 | Material::StainlessA4 => "stainless",
            Material::Aluminum => "aluminum",
            Material::Brass => "brass",
            Material::Copper => "copper",
            Material::Zinc => "zinc",
            Material::Titanium => "titanium",
            Material::Plastic => "plastic",
            Material::CastIron => "cast_iron",
        }
    }

    /// Plausible €/kg band for the material family. Model-supplied prices
    /// outside this band are replaced by the midpoint.
    pub fn price_band_eur_per_kg(&self) -> (f64, f64) {
        match self {
            Material::Steel => (0.8, 1.6),
            Material::StainlessA2 | Material::StainlessA4 => (2.5, 4.2),
            Material::Aluminum => (2.0, 3.0),
            Material::Brass => (7.0, 9.0),
            Material::Copper => (7.5, 9.5),
            Material::Titanium => (25.0, 45.0),
            Material::Zinc => (2.0, 3.5),
            Material::Plastic => (2.0, 4.0),
            Material::CastIron => (0.7, 1.4),
        }
    }

    /// Midpoint of the price band.
    pub fn price_band_midpoint(&self) -> f64 {
        let (lo, hi) = self.price_band_eur_per_kg();
        (lo + hi) / 2.0
    }

    /// Parse the snake_case label (as emitted by models and serde).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "steel" | "stahl" => Some(Material::Steel),
            "stainless_a2" | "a2" => Some(Material::StainlessA2),
            "stainless_a4" | "a4" => Some(Material::StainlessA4),
            "stainless" | "stainless_steel" | "edelstahl" => Some(Material::StainlessA2),
            "aluminum" | "aluminium" => Some(Material::Aluminum),
            "brass" | "messing" => Some(Material::Brass),
            "copper" | "kupfer" => Some(Material::Copper),
            "zinc" | "zink" => Some(Material::Zinc),
            "titanium" | "titan" => Some(Material::Titanium),
            "plastic" | "kunststoff" => Some(Material::Plastic),
            "cast_iron" | "grauguss" => Some(Material::CastIron),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Material::Steel => "steel",
            Material::StainlessA2 => "stainless_a2",
            Material::StainlessA4 => "stainless_a4",
            Material::Aluminum => "aluminum",
            Material::Brass => "brass",
            Material::Copper => "copper",
            Material::Zinc => "zinc",
            Material::Titanium => "titanium",
            Material::Plastic => "plastic",
            Material::CastIron => "cast_iron",
        }
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Geometric family of a fastener, selects the mass adjustment factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartFamily {
    /// Headless threaded cylinder (ISO 4028, DIN 913-916).
    SetScrew,
    /// Hex or socket head bolt (ISO 4014/4017/4762, DIN 931/933/912).
    HexBolt,
    /// Hex nut (ISO 4032, DIN 934/985).
    Nut,
    /// Flat washer (DIN 125, ISO 7089).
    Washer,
    /// Anything else: plain cylinder, no adjustment.
    Cylinder,
}

impl PartFamily {
    pub fn label(&self) -> &'static str {
        match self {
            PartFamily::SetScrew => "set_screw",
            PartFamily::HexBolt => "hex_bolt",
            PartFamily::Nut => "nut",
            PartFamily::Washer => "washer",
            PartFamily::Cylinder => "cylinder",
        }
    }
}

impl std::fmt::Display for PartFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Surface coating codes recognized out of the box. The orchestrator config
/// can extend this set at runtime.
pub const DEFAULT_COATING_CODES: &[&str] = &["VZ", "A2K", "ZN-NI", "GEOMET", "DACROMET", "TZN"];

/// Classifier output: base material plus recorded side channels.
#[derive(Debug, Clone)]
pub struct MaterialClassification {
    pub material: Material,
    pub surface_treatment: Option<String>,
    pub strength_class: Option<String>,
    /// Which rule of the chain decided the material (1-based, for traces).
    pub matched_rule: u8,
}

static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([A-Za-z][A-Za-z0-9\-]{0,11})\)").unwrap());

static STRENGTH_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s\-])(4\.6|5\.6|8\.8|10\.9|12\.9)(?:$|[\s\-])").unwrap());

static A4_CUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[\s\-/])(A4|1\.4401|1\.4404)(?:$|[\s\-/×x0-9])").unwrap());

static A2_CUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[\s\-/])(A2|1\.4301)(?:$|[\s\-/×x0-9])").unwrap());

/// Apply the material rule chain to a description.
///
/// `extra_coating_codes` extends [`DEFAULT_COATING_CODES`]; matching is
/// case-insensitive on both sets.
pub fn classify_material(text: &str, extra_coating_codes: &[String]) -> MaterialClassification {
    let has_st_prefix = text.to_uppercase().contains("ST-");
    let surface = extract_surface_code(text, extra_coating_codes);
    let strength = STRENGTH_CLASS
        .captures(text)
        .map(|c| c[1].to_string());

    // Rules 1-2: stainless cues are only valid outside parentheses and
    // without an ST- prefixed base.
    let a4 = !has_st_prefix && cue_outside_parens(text, &A4_CUE);
    let a2 = !has_st_prefix && cue_outside_parens(text, &A2_CUE);

    let (material, matched_rule) = if a4 {
        (Material::StainlessA4, 1)
    } else if a2 {
        (Material::StainlessA2, 2)
    } else if surface.is_some() && is_known_coating(surface.as_deref().unwrap_or(""), extra_coating_codes) {
        // Rule 3: a recognized coating code implies a steel base.
        (Material::Steel, 3)
    } else if has_st_prefix {
        (Material::Steel, 4)
    } else if let Some(m) = keyword_material(text) {
        (m, 5)
    } else if strength.is_some() {
        (Material::Steel, 6)
    } else {
        (Material::Steel, 7)
    };

    MaterialClassification {
        material,
        surface_treatment: surface,
        strength_class: strength,
        matched_rule,
    }
}

/// The stainless cue must occur outside any parenthesized group.
fn cue_outside_parens(text: &str, cue: &Regex) -> bool {
    let stripped = PARENTHESIZED.replace_all(text, "()");
    cue.is_match(&stripped)
}

/// Extract a parenthesized surface-treatment code, if any. Known codes are
/// preferred; an unknown all-caps short token is still recorded so the
/// information is not lost, it just does not drive the material rule.
fn extract_surface_code(text: &str, extra: &[String]) -> Option<String> {
    let mut fallback = None;
    for caps in PARENTHESIZED.captures_iter(text) {
        let code = caps[1].to_string();
        if is_known_coating(&code, extra) {
            return Some(code.to_uppercase());
        }
        if fallback.is_none() && code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-') {
            fallback = Some(code);
        }
    }
    // German shorthand for galvanized, common in ERP exports.
    if fallback.is_none() && text.to_lowercase().contains("verzinkt") {
        fallback = Some("VZ".to_string());
    }
    fallback
}

fn is_known_coating(code: &str, extra: &[String]) -> bool {
    let upper = code.to_uppercase();
    DEFAULT_COATING_CODES.iter().any(|c| *c == upper)
        || extra.iter().any(|c| c.to_uppercase() == upper)
}

/// Rule 5 keyword cues, checked in order.
fn keyword_material(text: &str) -> Option<Material> {
    let lower = text.to_lowercase();
    const CUES: &[(&[&str], Material)] = &[
        (&["alu", "almg", "alsi", "al99"], Material::Aluminum),
        (&["messing", "brass", "cuzn"], Material::Brass),
        (&["kupfer", "copper"], Material::Copper),
        (
            &["kunststoff", "plastic", "nylon", "pa6", "pom", "ptfe", "peek"],
            Material::Plastic,
        ),
        (&["titan"], Material::Titanium),
        (&["zamak", "zinkdruckguss"], Material::Zinc),
        (&["grauguss", "gg25", "ggg40", "cast iron"], Material::CastIron),
    ];
    for (cues, material) in CUES {
        if cues.iter().any(|c| lower.contains(c)) {
            return Some(*material);
        }
    }
    None
}

static SET_SCREW_CUES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(ISO\s*4028|DIN\s*91[3-6]|madenschraube|gewindestift|set\s*screw)").unwrap()
});

static HEX_BOLT_CUES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(ISO\s*401[47]|ISO\s*4762|DIN\s*93[13]|DIN\s*912|DIN\s*6912|sechskantschraube|zylinderschraube|hex\s*bolt|cap\s*screw)",
    )
    .unwrap()
});

static NUT_CUES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(ISO\s*4032|DIN\s*934|DIN\s*98[25]|mutter|hex\s*nut)").unwrap()
});

static WASHER_CUES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(DIN\s*125|DIN\s*9021|ISO\s*7089|scheibe|washer)").unwrap()
});

/// Infer the geometric family from norm identifiers and keywords.
pub fn detect_part_family(text: &str) -> PartFamily {
    if SET_SCREW_CUES.is_match(text) {
        PartFamily::SetScrew
    } else if NUT_CUES.is_match(text) {
        PartFamily::Nut
    } else if WASHER_CUES.is_match(text) {
        PartFamily::Washer
    } else if HEX_BOLT_CUES.is_match(text) {
        PartFamily::HexBolt
    } else {
        PartFamily::Cylinder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_outside_parens() {
        let c = classify_material("ISO 4017-A4-80-M12×60", &[]);
        assert_eq!(c.material, Material::StainlessA4);
        assert_eq!(c.matched_rule, 1);
    }

    #[test]
    fn test_a2_outside_parens() {
        let c = classify_material("DIN934-A2-70-M10", &[]);
        assert_eq!(c.material, Material::StainlessA2);
        assert_eq!(c.matched_rule, 2);
    }

    #[test]
    fn test_werkstoff_numbers() {
        assert_eq!(
            classify_material("Schraube 1.4404 M8", &[]).material,
            Material::StainlessA4
        );
        assert_eq!(
            classify_material("Schraube 1.4301 M8", &[]).material,
            Material::StainlessA2
        );
    }

    #[test]
    fn test_parenthesized_coating_stays_steel() {
        // A2K looks stainless but is a coating code; base stays steel.
        let c = classify_material("DIN933-ST-(A2K)-M8×25", &[]);
        assert_eq!(c.material, Material::Steel);
        assert_eq!(c.surface_treatment.as_deref(), Some("A2K"));
    }

    #[test]
    fn test_zn_ni_coating() {
        let c = classify_material("ISO 4028-10.9-(ZN-NI)-M10×1,25×45", &[]);
        assert_eq!(c.material, Material::Steel);
        assert_eq!(c.surface_treatment.as_deref(), Some("ZN-NI"));
        assert_eq!(c.strength_class.as_deref(), Some("10.9"));
    }

    #[test]
    fn test_st_prefix() {
        let c = classify_material("ST-Bolzen 12x40", &[]);
        assert_eq!(c.material, Material::Steel);
        assert_eq!(c.matched_rule, 4);
    }

    #[test]
    fn test_keyword_materials() {
        assert_eq!(classify_material("AlMg3-Flansch Ø40 L20", &[]).material, Material::Aluminum);
        assert_eq!(classify_material("Messing-Mutter M6", &[]).material, Material::Brass);
        assert_eq!(classify_material("Kupferscheibe 10x1", &[]).material, Material::Copper);
        assert_eq!(classify_material("POM Distanzhülse", &[]).material, Material::Plastic);
        assert_eq!(classify_material("Titan Schraube M5", &[]).material, Material::Titanium);
    }

    #[test]
    fn test_strength_class_implies_steel() {
        let c = classify_material("M6×30 8.8 verzinkt", &[]);
        assert_eq!(c.material, Material::Steel);
        assert_eq!(c.strength_class.as_deref(), Some("8.8"));
        assert_eq!(c.surface_treatment.as_deref(), Some("VZ"));
    }

    #[test]
    fn test_default_is_steel() {
        let c = classify_material("Irgendein Teil 123", &[]);
        assert_eq!(c.material, Material::Steel);
        assert_eq!(c.matched_rule, 7);
    }

    #[test]
    fn test_extensible_coating_codes() {
        let extra = vec!["FLZN".to_string()];
        let c = classify_material("Schraube (FLZN) M8×20", &extra);
        assert_eq!(c.material, Material::Steel);
        assert_eq!(c.matched_rule, 3);
        assert_eq!(c.surface_treatment.as_deref(), Some("FLZN"));
    }

    #[test]
    fn test_family_detection() {
        assert_eq!(detect_part_family("ISO 4028 M10×45"), PartFamily::SetScrew);
        assert_eq!(detect_part_family("DIN933 M8×25"), PartFamily::HexBolt);
        assert_eq!(detect_part_family("DIN934-A2-70-M10"), PartFamily::Nut);
        assert_eq!(detect_part_family("Scheibe DIN 125 M10"), PartFamily::Washer);
        assert_eq!(detect_part_family("Bolzen D=12 L=30"), PartFamily::Cylinder);
    }
}
