//! Prompt templates for LLM interactions.

use crate::commodity::CommodityPoint;
use crate::normalize::{Material, NormalizedPart};
use crate::planner::{Process, Regime, RouteIdentification};
use crate::supplier::{CompetencyProfile, SupplierProfile, SupplierRating};

/// Density table rendered into estimator prompts. Keeping the model's
/// reference numbers identical to the physics kernel's avoids spurious
/// mass-override churn.
fn density_table() -> String {
    let mut rows = String::new();
    for material in Material::ALL {
        rows.push_str(&format!(
            "  - {}: {:.2} g/cm^3, market band {:.2}-{:.2} EUR/kg\n",
            material.label(),
            material.density_g_cm3(),
            material.price_band_eur_per_kg().0,
            material.price_band_eur_per_kg().1
        ));
    }
    rows
}

fn process_catalog() -> String {
    Process::ALL
        .iter()
        .map(|p| p.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// System prompt for the part estimation call.
pub fn estimator_system_prompt() -> String {
    format!(
        r#"You are a cost estimation expert for fastener-class turned and formed parts
(screws, bolts, nuts, washers, pins, bushings).

Reference densities and raw-material price bands:
{}
Worked example: an M10x45 set screw in steel is approximated as a cylinder,
volume = pi * 5^2 * 45 = 3534.29 mm^3, mass = 3534.29 * 7.85 / 1000 = 27.74 g.

Guidelines:
- Treat the cylinder model as the baseline; adjust for head or nut geometry.
- Parenthesized suffixes like (VZ) or (A2K) are coatings, never the base material.
- A2/A4 designations indicate stainless steel only when they stand alone, not
  inside a coating suffix.
- Stay inside the market price band for the identified material.
- Always respond with valid JSON when requested."#,
        density_table()
    )
}

/// User prompt for the part estimation call.
pub fn estimator_prompt(part: &NormalizedPart) -> String {
    let geometry = match (part.diameter_mm, part.length_mm) {
        (Some(d), Some(l)) => format!("diameter {:.2} mm, length {:.2} mm", d, l),
        (Some(d), None) => format!("diameter {:.2} mm, length unknown", d),
        (None, Some(l)) => format!("diameter unknown, length {:.2} mm", l),
        (None, None) => "no dimensions recognized".to_string(),
    };

    format!(
        r#"Estimate material, mass and raw-material price for this part.

## Part
- Description: "{}"
- Classified material: {}
- Part family: {}
- Geometry: {}
- Surface treatment: {}
- Strength class: {}

## Task
Confirm or correct the material, estimate the per-unit mass and the raw
material price. If the description implies a coating, name it.

Respond with a JSON object:
{{
  "material": "steel|stainless_a2|stainless_a4|aluminum|brass|copper|zinc|titanium|plastic|cast_iron",
  "d_mm": null or 0.0,
  "l_mm": null or 0.0,
  "mass_kg_per_unit": 0.0,
  "material_price_eur_per_kg": 0.0,
  "coating": null or "coating code",
  "step_by_step": ["volume = pi * r^2 * l = ...", "mass = ..."]
}}"#,
        part.raw,
        part.material.label(),
        part.family.label(),
        geometry,
        part.surface_treatment.as_deref().unwrap_or("none detected"),
        part.strength_class.as_deref().unwrap_or("none detected"),
    )
}

/// System prompt for route identification (planner step 1).
pub fn route_system_prompt(regime: Regime, ceiling_eur_per_unit: Option<f64>) -> String {
    let (band_lo, band_hi) = regime.cycle_band_s();
    let ceiling_line = match ceiling_eur_per_unit {
        Some(c) => format!(
            "At this volume the fabrication cost must stay below {:.3} EUR/unit.",
            c
        ),
        None => "No hard fabrication cost ceiling applies at this volume.".to_string(),
    };

    format!(
        r#"You are a production planning expert for fastener manufacturing.

Production regime: {} with an expected primary cycle time of {:.1}-{:.1} seconds.
{}

Choose the primary process from this catalog: {}.
Secondary operations come from the same catalog. If the cycle time must exceed
the regime band, provide a concrete justification.

Always respond with valid JSON when requested."#,
        regime,
        band_lo,
        band_hi,
        ceiling_line,
        process_catalog()
    )
}

/// User prompt for route identification (planner step 1).
pub fn route_prompt(
    part: &NormalizedPart,
    lot_size: u64,
    mass_kg: Option<f64>,
    regime: Regime,
    competencies: Option<&CompetencyProfile>,
) -> String {
    let mass_line = match mass_kg {
        Some(m) => format!("{:.2} g", m * 1000.0),
        None => "unknown".to_string(),
    };
    let supplier_block = match competencies {
        Some(profile) => format!(
            "## Supplier Capabilities\n{}",
            profile.to_prompt_string()
        ),
        None => "## Supplier Capabilities\nNo supplier profile available.".to_string(),
    };

    format!(
        r#"Identify the manufacturing route for this part.

## Part
- Description: "{}"
- Material: {}
- Family: {}
- Mass per unit: {}
- Lot size: {} units ({} regime)

{}

Respond with a JSON object:
{{
  "primary_process": "process name from the catalog",
  "secondary_processes": ["..."],
  "material_compatibility": "1 sentence on material/process fit",
  "supplier_fit": "1 sentence on supplier fit, or null",
  "expected_cycle_time_seconds": 0.0,
  "cycle_time_justification": null or "reason the cycle exceeds the regime band"
}}"#,
        part.raw,
        part.material.label(),
        part.family.label(),
        mass_line,
        lot_size,
        regime,
        supplier_block
    )
}

/// System prompt for detailed costing (planner step 2).
pub fn costing_system_prompt() -> &'static str {
    r#"You are a manufacturing cost engineer for high-volume fastener production.

Cost model, computed per unit:
- variable = cycle_s * (machine_rate + labor_rate) / 3600
- variable_with_overhead = variable * (1 + overhead)
- setup_per_unit = (setup_min / 60 * (machine_rate + labor_rate)) / lot_size
- fabrication = variable_with_overhead + setup_per_unit + sum(secondary ops)

State overhead as a fraction (0.20 for 20 %). Use realistic European machine
and labor rates. Always respond with valid JSON when requested."#
}

/// User prompt for detailed costing (planner step 2).
pub fn costing_prompt(route: &RouteIdentification, regime: Regime, lot_size: u64) -> String {
    let secondary = if route.secondary_processes.is_empty() {
        "none".to_string()
    } else {
        route.secondary_processes.join(", ")
    };

    format!(
        r#"Provide detailed cost parameters for this route.

## Route
- Primary process: {}
- Secondary operations: {}
- Expected primary cycle: {:.2} s
- Lot size: {} units ({} regime)

Respond with a JSON object:
{{
  "primary": {{
    "name": "{}",
    "setup_time_min": 0.0,
    "cycle_time_s": 0.0,
    "machine_eur_h": 0.0,
    "labor_eur_h": 0.0,
    "overhead_pct": 0.0
  }},
  "secondary_ops": [
    {{"name": "...", "cycle_time_s": 0.0, "machine_eur_h": 0.0,
      "labor_eur_h": 0.0, "overhead_pct": 0.0}}
  ],
  "route_narrative": ["step 1", "step 2"],
  "fab_cost_eur_per_unit": 0.0
}}"#,
        route.primary_process,
        secondary,
        route.expected_cycle_time_s,
        lot_size,
        regime,
        route.primary_process
    )
}

/// Number of article-history lines fed to the competency analyzer.
pub const COMPETENCY_HISTORY_LIMIT: usize = 50;

/// System prompt for supplier competency analysis.
pub fn competency_system_prompt() -> String {
    format!(
        r#"You are a supplier qualification analyst for the fastener industry.

From a supplier's article history, infer which manufacturing processes the
supplier has demonstrated. Use only these process names: {}.
Capability levels: basic, proficient, expert. Cite the article lines that
support each inference as evidence.

Always respond with valid JSON when requested."#,
        process_catalog()
    )
}

/// User prompt for supplier competency analysis.
pub fn competency_prompt(supplier: &SupplierProfile) -> String {
    let history = supplier
        .article_history
        .iter()
        .take(COMPETENCY_HISTORY_LIMIT)
        .map(|a| format!("  - {}", a))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze this supplier's demonstrated competencies.

## Supplier
- Name: {}
- Country: {}

## Article History ({} of {} entries)
{}

Respond with a JSON object:
{{
  "core_competencies": [
    {{"process": "...", "capability_level": "basic|proficient|expert",
      "confidence": "low|medium|high", "evidence": ["article line"]}}
  ],
  "material_expertise": ["steel", "..."],
  "material_process_compatibility": {{"steel": ["cold_forming", "..."]}},
  "unsuitable_processes": ["..."],
  "preferred_lot_sizes": ["e.g. 10k-100k"]
}}"#,
        supplier.name,
        supplier.country,
        supplier.article_history.len().min(COMPETENCY_HISTORY_LIMIT),
        supplier.article_history.len(),
        history
    )
}

/// System prompt for supplier rating.
pub fn rating_system_prompt() -> &'static str {
    r#"You are a procurement risk analyst for direct-material sourcing.

Rate suppliers with an integer score from 1 (worst) to 10 (best) and a risk
level of low, medium, high or critical. Ground every strength and weakness in
the supplied history. Always respond with valid JSON when requested."#
}

/// User prompt for supplier rating.
pub fn rating_prompt(supplier: &SupplierProfile, commodity: Option<&CommodityPoint>) -> String {
    let price_history = if supplier.price_history_eur.is_empty() {
        "no price history".to_string()
    } else {
        supplier
            .price_history_eur
            .iter()
            .map(|p| format!("{:.3}", p))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let market_line = match commodity {
        Some(point) => format!(
            "Market context: {} at {:.2} EUR/kg, {} ({:+.1}% over {} days).",
            point.material_family,
            point.price_eur_per_kg,
            point.trend.label(),
            point.trend_pct,
            point.window_days
        ),
        None => "Market context: no commodity data available.".to_string(),
    };

    format!(
        r#"Rate this supplier.

## Supplier
- Name: {}
- Country: {}
- Article history: {} entries
- Recent unit prices (EUR): {}

{}

Respond with a JSON object:
{{
  "rating": 1-10,
  "risk_level": "low|medium|high|critical",
  "company_analysis": "1-2 sentences",
  "country_analysis": "1-2 sentences on sourcing from this country",
  "article_fit": "1-2 sentences on fit between history and this part class",
  "strengths": ["..."],
  "weaknesses": ["..."],
  "recommendations": ["..."]
}}"#,
        supplier.name,
        supplier.country,
        supplier.article_history.len(),
        price_history,
        market_line
    )
}

/// System prompt for negotiation planning.
pub fn negotiation_system_prompt() -> &'static str {
    r#"You are a procurement negotiation strategist for direct materials.

Build concrete, evidence-backed negotiation plans from the buyer's side.
Anchor every argument in the supplied cost estimate, supplier rating and
market trend. Always respond with valid JSON when requested."#
}

/// Market-trend directive injected into negotiation prompts.
fn trend_directive(commodity: Option<&CommodityPoint>) -> String {
    use crate::commodity::Trend;

    match commodity.map(|c| c.trend) {
        Some(Trend::SteepDown) => format!(
            "Raw material prices are falling sharply ({:+.1}%): demand an immediate price reduction and reference the trend explicitly.",
            commodity.map(|c| c.trend_pct).unwrap_or(0.0)
        ),
        Some(Trend::MildDown) => {
            "Raw material prices are softening: ask for a modest reduction or improved terms.".to_string()
        }
        Some(Trend::Stable) => {
            "Raw material prices are stable: focus on volume commitments and payment terms rather than price.".to_string()
        }
        Some(Trend::MildUp) => {
            "Raw material prices are drifting up: push to fix pricing for the contract period.".to_string()
        }
        Some(Trend::SteepUp) => format!(
            "Raw material prices are rising sharply ({:+.1}%): lock in current pricing with urgency before the next adjustment.",
            commodity.map(|c| c.trend_pct).unwrap_or(0.0)
        ),
        None => "No market trend data: negotiate from the cost breakdown alone.".to_string(),
    }
}

/// Historical minimum materially below the current price, as a fraction.
const PRICE_SPREAD_THRESHOLD: f64 = 0.05;

/// Directive on the spread between the historical minimum price and the
/// current price, when the history shows one worth exploiting.
fn price_spread_directive(supplier: &SupplierProfile) -> Option<String> {
    let current = *supplier.price_history_eur.last()?;
    let min_price = supplier
        .price_history_eur
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    if min_price.is_finite() && current > 0.0 && min_price < current * (1.0 - PRICE_SPREAD_THRESHOLD)
    {
        Some(format!(
            "The supplier has sold at {:.4} EUR/unit before, {:.1}% below the current {:.4}: exploit that spread.",
            min_price,
            (1.0 - min_price / current) * 100.0,
            current
        ))
    } else {
        None
    }
}

/// User prompt for negotiation planning.
pub fn negotiation_prompt(
    supplier: &SupplierProfile,
    rating: Option<&SupplierRating>,
    commodity: Option<&CommodityPoint>,
    estimate_summary: &str,
) -> String {
    let rating_block = match rating {
        Some(r) => format!(
            "- Rating: {}/10, risk {}\n- Fit: {}",
            r.rating,
            r.risk_level.label(),
            r.article_fit.as_deref().unwrap_or("not assessed")
        ),
        None => "- No rating available.".to_string(),
    };
    let mut market = trend_directive(commodity);
    if let Some(spread) = price_spread_directive(supplier) {
        market.push('\n');
        market.push_str(&spread);
    }

    format!(
        r#"Plan a price negotiation with this supplier.

## Supplier
- Name: {} ({})
{}

## Our Position
- Cost estimate: {}

## Market
{}

Respond with a JSON object:
{{
  "strategy_overview": "2-3 sentences",
  "objectives": {{"primary_goal": "...", "batna": "..."}},
  "key_arguments": ["..."],
  "tactics": ["..."],
  "concessions": ["what we can give, in order"],
  "red_flags": ["supplier behaviors that end the talk"],
  "opening_statement": "...",
  "closing_statement": "..."
}}"#,
        supplier.name,
        supplier.country,
        rating_block,
        estimate_summary,
        market
    )
}
