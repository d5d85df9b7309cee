//! Swage CLI - cost estimation for fastener-class parts.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Estimate {
            description,
            lot_size,
            supplier,
            country,
            distance_km,
            no_commodity,
            mock_llm,
            deadline_s,
            json,
        } => commands::estimate::run(
            description,
            lot_size,
            supplier,
            country,
            distance_km,
            no_commodity,
            mock_llm,
            deadline_s,
            json,
            cli.verbose,
        ),

        Commands::Co2 {
            mass_kg,
            material,
            country,
            distance_km,
            mode,
            cbam_price,
            json,
        } => commands::co2::run(mass_kg, material, country, distance_km, mode, cbam_price, json),

        Commands::Rate { supplier, json } => commands::supplier::rate(supplier, json),

        Commands::Negotiate {
            supplier,
            summary,
            json,
        } => commands::supplier::negotiate(supplier, summary, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
