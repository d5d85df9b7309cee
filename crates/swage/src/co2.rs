//! CO₂ footprint and CBAM cost kernel.
//!
//! Pure arithmetic over fixed factor tables. Production emissions scale with
//! mass and material, transport emissions with mass, distance and mode. The
//! border adjustment applies to production emissions only, and only when the
//! origin country is outside the EU set.

use serde::{Deserialize, Serialize};

use crate::normalize::Material;

/// Default CBAM certificate price, EUR per tonne CO₂.
pub const DEFAULT_CBAM_PRICE_EUR_PER_TON: f64 = 100.0;

/// Distance above which the default transport mode flips to ship.
pub const SHIP_DISTANCE_THRESHOLD_KM: f64 = 5_000.0;

/// Fallback distance for countries not in the table.
const UNKNOWN_COUNTRY_DISTANCE_KM: f64 = 6_000.0;

/// Transport mode with its emission factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Truck,
    Rail,
    Ship,
    Air,
}

impl TransportMode {
    /// kg CO₂ per kg payload per km.
    pub fn factor_kg_per_kg_km(&self) -> f64 {
        match self {
            TransportMode::Truck => 1.2e-4,
            TransportMode::Rail => 3.0e-5,
            TransportMode::Ship => 1.5e-5,
            TransportMode::Air => 1.6e-3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransportMode::Truck => "truck",
            TransportMode::Rail => "rail",
            TransportMode::Ship => "ship",
            TransportMode::Air => "air",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "truck" | "road" | "lkw" => Some(TransportMode::Truck),
            "rail" | "train" => Some(TransportMode::Rail),
            "ship" | "sea" | "ocean" => Some(TransportMode::Ship),
            "air" | "plane" => Some(TransportMode::Air),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Production emissions, kg CO₂ per kg of finished part.
pub fn production_factor_kg_per_kg(material: Material) -> f64 {
    match material {
        Material::Steel => 1.85,
        Material::StainlessA2 | Material::StainlessA4 => 3.1,
        Material::Aluminum => 8.2,
        Material::Brass => 3.5,
        Material::Copper => 3.8,
        Material::Zinc => 3.0,
        Material::Titanium => 20.0,
        Material::Plastic => 3.0,
        Material::CastIron => 1.5,
    }
}

/// EU membership by ISO 3166-1 alpha-2 code.
pub fn is_eu_country(country: &str) -> bool {
    const EU: &[&str] = &[
        "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT",
        "LV", "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
    ];
    EU.contains(&country.trim().to_uppercase().as_str())
}

/// Default shipping distance to a central European plant, km.
fn default_distance_km(country: &str) -> Option<f64> {
    let km = match country.trim().to_uppercase().as_str() {
        "DE" => 300.0,
        "AT" => 500.0,
        "CZ" => 450.0,
        "PL" => 700.0,
        "NL" => 600.0,
        "FR" => 800.0,
        "IT" => 900.0,
        "GB" => 900.0,
        "ES" => 1_600.0,
        "TR" => 2_200.0,
        "IN" => 7_000.0,
        "US" => 7_500.0,
        "CN" => 8_000.0,
        "KR" => 8_800.0,
        "VN" => 9_000.0,
        "TW" => 9_500.0,
        _ => return None,
    };
    Some(km)
}

/// One CO₂/CBAM assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Co2Report {
    pub production_kg: f64,
    pub transport_kg: f64,
    pub total_kg: f64,
    pub cbam_cost_eur: f64,
    pub is_eu_source: bool,
    pub transport_mode: TransportMode,
    pub distance_km: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Compute the footprint for one unit of `mass_kg` sourced from `country`.
///
/// `distance_km` and `mode` override the country defaults; without an
/// explicit mode, distances above [`SHIP_DISTANCE_THRESHOLD_KM`] go by ship,
/// shorter ones by truck.
pub fn co2_footprint(
    mass_kg: f64,
    material: Material,
    country: &str,
    distance_km: Option<f64>,
    mode: Option<TransportMode>,
    cbam_price_eur_per_ton: f64,
) -> Co2Report {
    let mut notes = Vec::new();

    let distance = match distance_km {
        Some(d) => d.max(0.0),
        None => match default_distance_km(country) {
            Some(d) => d,
            None => {
                notes.push(format!(
                    "no distance table entry for '{}'; {} km assumed",
                    country, UNKNOWN_COUNTRY_DISTANCE_KM
                ));
                UNKNOWN_COUNTRY_DISTANCE_KM
            }
        },
    };

    let transport_mode = mode.unwrap_or_else(|| {
        if distance > SHIP_DISTANCE_THRESHOLD_KM {
            TransportMode::Ship
        } else {
            TransportMode::Truck
        }
    });

    let production_kg = mass_kg * production_factor_kg_per_kg(material);
    let transport_kg = mass_kg * transport_mode.factor_kg_per_kg_km() * distance;
    let is_eu_source = is_eu_country(country);
    let cbam_cost_eur = if is_eu_source {
        0.0
    } else {
        production_kg / 1_000.0 * cbam_price_eur_per_ton
    };

    Co2Report {
        production_kg,
        transport_kg,
        total_kg: production_kg + transport_kg,
        cbam_cost_eur,
        is_eu_source,
        transport_mode,
        distance_km: distance,
        notes,
    }
}
