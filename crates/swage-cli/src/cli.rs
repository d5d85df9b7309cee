//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Swage: LLM-assisted cost estimation for fastener-class parts
#[derive(Parser)]
#[command(name = "swage")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate cost, mass and CO2 for a part description
    Estimate {
        /// Free-form part description (e.g. "DIN933 M8×25 8.8 verzinkt")
        #[arg(value_name = "DESCRIPTION")]
        description: String,

        /// Lot size in units
        #[arg(short, long, default_value = "1000")]
        lot_size: u64,

        /// Supplier profile JSON file (name, country, article_history, price_history_eur)
        #[arg(short, long)]
        supplier: Option<PathBuf>,

        /// Origin country override (ISO 3166-1 alpha-2)
        #[arg(short, long)]
        country: Option<String>,

        /// Transport distance override in km
        #[arg(long)]
        distance_km: Option<f64>,

        /// Disable the commodity price feed
        #[arg(long)]
        no_commodity: bool,

        /// Run offline on the mock transport (deterministic fallback estimate)
        #[arg(long)]
        mock_llm: bool,

        /// Per-estimate deadline in seconds
        #[arg(long, default_value = "90")]
        deadline_s: u64,

        /// Output the full estimate as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the CO2 footprint and CBAM cost for a mass/material/origin
    Co2 {
        /// Mass per unit in kg
        #[arg(value_name = "MASS_KG")]
        mass_kg: f64,

        /// Material (e.g. steel, stainless_a2, aluminum)
        #[arg(value_name = "MATERIAL")]
        material: String,

        /// Origin country (ISO 3166-1 alpha-2)
        #[arg(short, long, default_value = "DE")]
        country: String,

        /// Transport distance override in km
        #[arg(long)]
        distance_km: Option<f64>,

        /// Transport mode override (truck, rail, ship, air)
        #[arg(long)]
        mode: Option<String>,

        /// CBAM certificate price in EUR per tonne CO2
        #[arg(long, default_value = "100")]
        cbam_price: f64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rate a supplier from its profile
    Rate {
        /// Supplier profile JSON file
        #[arg(value_name = "SUPPLIER_FILE")]
        supplier: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a negotiation plan for a supplier
    Negotiate {
        /// Supplier profile JSON file
        #[arg(value_name = "SUPPLIER_FILE")]
        supplier: PathBuf,

        /// One-line cost estimate summary to anchor the plan on
        #[arg(short, long, default_value = "no cost estimate available")]
        summary: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
