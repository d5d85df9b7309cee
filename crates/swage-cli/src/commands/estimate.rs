//! Estimate command - run a full part estimate.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use swage::llm::mock::MockTransport;
use swage::{Confidence, EstimateRequest, Swage, SwageConfig};

#[allow(clippy::too_many_arguments)]
pub fn run(
    description: String,
    lot_size: u64,
    supplier_file: Option<PathBuf>,
    country: Option<String>,
    distance_km: Option<f64>,
    no_commodity: bool,
    mock_llm: bool,
    deadline_s: u64,
    json: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = SwageConfig::default()
        .with_commodity_enabled(!no_commodity)
        .with_deadline(Duration::from_secs(deadline_s));
    let swage = if mock_llm {
        // Empty script: every model call degrades to the deterministic path.
        Swage::with_transport(config, Arc::new(MockTransport::new()))?
    } else {
        Swage::new(config)?
    };

    let mut request = EstimateRequest::new(&description, lot_size);
    if let Some(path) = supplier_file {
        request = request.with_supplier(super::load_supplier(&path)?);
    }
    if let Some(c) = country {
        request = request.with_country(c);
    }
    if let Some(km) = distance_km {
        request = request.with_distance_km(km);
    }

    println!(
        "{} {} (lot {})",
        "Estimating".cyan().bold(),
        description.white(),
        lot_size
    );

    let estimate = swage.estimate(&request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
        return Ok(());
    }

    println!();
    println!(
        "  Material:        {} ({})",
        estimate.material.to_string().white().bold(),
        estimate
            .material_details
            .surface_treatment
            .as_deref()
            .unwrap_or("uncoated")
    );
    if let Some(mass) = estimate.mass_kg {
        println!("  Mass:            {:.2} g", mass * 1000.0);
    }
    println!(
        "  Material price:  {:.2} EUR/kg",
        estimate.material_price_eur_per_kg
    );
    if let Some(cost) = estimate.material_cost_eur_per_unit {
        println!("  Material cost:   {:.4} EUR/unit", cost);
    }
    if let Some(plan) = &estimate.fabrication {
        println!(
            "  Route:           {} ({} regime)",
            plan.route_narrative.join(" -> "),
            plan.regime
        );
    }
    if let Some(fab) = estimate.fab_cost_eur_per_unit {
        println!("  Fabrication:     {:.4} EUR/unit", fab);
    }
    if let Some(total) = estimate.total_unit_cost_eur {
        println!(
            "  {}           {} EUR/unit",
            "Total:".bold(),
            format!("{:.4}", total).white().bold()
        );
    }
    if let Some(co2) = &estimate.co2 {
        println!(
            "  CO2:             {:.1} g/unit, CBAM {:.4} EUR ({})",
            co2.total_kg * 1000.0,
            co2.cbam_cost_eur,
            if co2.is_eu_source { "EU" } else { "non-EU" }
        );
    }
    if let Some(rating) = &estimate.rating {
        println!(
            "  Supplier:        {}/10, risk {}",
            rating.rating,
            rating.risk_level.label()
        );
    }

    let confidence = match estimate.confidence {
        Confidence::High => "high".green().bold(),
        Confidence::Medium => "medium".yellow().bold(),
        Confidence::Low => "low".red().bold(),
    };
    println!("  Confidence:      {}", confidence);

    if !estimate.llm_errors.is_empty() {
        println!();
        for err in &estimate.llm_errors {
            println!("  {} {}", "llm:".red(), err);
        }
    }

    if verbose {
        println!();
        println!("{}", "Assumptions:".yellow().bold());
        for assumption in &estimate.assumptions {
            println!("  - {}", assumption);
        }
        println!();
        println!("{}", "Trace:".yellow().bold());
        for line in &estimate.calculation_trace {
            println!("  {}", line);
        }
        println!();
        println!("Tokens used: {}", estimate.tokens_used);
    }

    Ok(())
}
