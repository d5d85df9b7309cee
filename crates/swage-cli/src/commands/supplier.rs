//! Rate and negotiate commands - supplier operations without a part.

use std::path::PathBuf;

use colored::Colorize;
use swage::{RiskLevel, Swage, SwageConfig};

pub fn rate(supplier_file: PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let supplier = super::load_supplier(&supplier_file)?;
    let swage = Swage::new(SwageConfig::default())?;

    println!(
        "{} {} ({})",
        "Rating".cyan().bold(),
        supplier.name.white(),
        supplier.country
    );

    let outcome = swage.rate_supplier(&supplier)?;
    let rating = outcome.rating;

    if json {
        println!("{}", serde_json::to_string_pretty(&rating)?);
        return Ok(());
    }

    let risk = match rating.risk_level {
        RiskLevel::Low => rating.risk_level.label().green(),
        RiskLevel::Medium => rating.risk_level.label().yellow(),
        RiskLevel::High | RiskLevel::Critical => rating.risk_level.label().red(),
    };
    println!();
    println!(
        "  Score: {}/10, risk {}",
        rating.rating.to_string().white().bold(),
        risk.bold()
    );
    if let Some(fit) = &rating.article_fit {
        println!("  Fit:   {}", fit);
    }
    if !rating.strengths.is_empty() {
        println!();
        println!("{}", "Strengths:".green().bold());
        for s in &rating.strengths {
            println!("  + {}", s);
        }
    }
    if !rating.weaknesses.is_empty() {
        println!();
        println!("{}", "Weaknesses:".red().bold());
        for w in &rating.weaknesses {
            println!("  - {}", w);
        }
    }
    if !rating.recommendations.is_empty() {
        println!();
        println!("{}", "Recommendations:".yellow().bold());
        for r in &rating.recommendations {
            println!("  * {}", r);
        }
    }

    Ok(())
}

pub fn negotiate(
    supplier_file: PathBuf,
    summary: String,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let supplier = super::load_supplier(&supplier_file)?;
    let swage = Swage::new(SwageConfig::default())?;

    println!(
        "{} {} ({})",
        "Planning negotiation with".cyan().bold(),
        supplier.name.white(),
        supplier.country
    );

    let rating = swage.rate_supplier(&supplier).ok().map(|o| o.rating);
    let plan = swage.plan_negotiation(&supplier, rating.as_ref(), &summary)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!();
    println!("{}", "Strategy:".yellow().bold());
    println!("  {}", plan.strategy_overview);
    println!("  Goal:  {}", plan.objectives.primary_goal);
    println!("  BATNA: {}", plan.objectives.batna);
    if let Some(trend) = &plan.market_trend {
        println!("  Market trend: {}", trend);
    }
    if !plan.key_arguments.is_empty() {
        println!();
        println!("{}", "Arguments:".yellow().bold());
        for a in &plan.key_arguments {
            println!("  - {}", a);
        }
    }
    if !plan.tactics.is_empty() {
        println!();
        println!("{}", "Tactics:".yellow().bold());
        for t in &plan.tactics {
            println!("  - {}", t);
        }
    }
    if !plan.red_flags.is_empty() {
        println!();
        println!("{}", "Red flags:".red().bold());
        for r in &plan.red_flags {
            println!("  - {}", r);
        }
    }
    println!();
    println!("{} {}", "Opening:".green().bold(), plan.opening_statement);
    println!("{} {}", "Closing:".green().bold(), plan.closing_statement);

    Ok(())
}
