//! Co2 command - pure footprint computation, no API access needed.

use colored::Colorize;
use swage::co2::TransportMode;
use swage::{co2_footprint, Material};

pub fn run(
    mass_kg: f64,
    material: String,
    country: String,
    distance_km: Option<f64>,
    mode: Option<String>,
    cbam_price: f64,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let material = Material::from_label(&material)
        .ok_or_else(|| format!("Unknown material: {}", material))?;
    let mode = match mode {
        Some(m) => Some(
            TransportMode::from_label(&m).ok_or_else(|| format!("Unknown transport mode: {}", m))?,
        ),
        None => None,
    };
    if mass_kg <= 0.0 {
        return Err("Mass must be positive".into());
    }

    let report = co2_footprint(mass_kg, material, &country, distance_km, mode, cbam_price);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {:.3} kg of {} from {}",
        "Footprint for".cyan().bold(),
        mass_kg,
        material,
        country.to_uppercase()
    );
    println!("  Production:  {:.4} kg CO2", report.production_kg);
    println!(
        "  Transport:   {:.4} kg CO2 ({} over {:.0} km)",
        report.transport_kg, report.transport_mode, report.distance_km
    );
    println!("  Total:       {:.4} kg CO2", report.total_kg);
    let cbam = if report.is_eu_source {
        "0.0000 EUR (EU source)".green().to_string()
    } else {
        format!("{:.4} EUR", report.cbam_cost_eur).yellow().to_string()
    };
    println!("  CBAM:        {}", cbam);
    for note in &report.notes {
        println!("  {} {}", "note:".yellow(), note);
    }

    Ok(())
}
