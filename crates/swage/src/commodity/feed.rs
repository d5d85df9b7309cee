//! Commodity feed trait and point record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::normalize::Material;

/// One commodity price observation for a material family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommodityPoint {
    /// Coarse material family the price applies to (e.g. "steel").
    pub material_family: String,
    /// Current price in €/kg.
    pub price_eur_per_kg: f64,
    /// Percent change over the window (positive = up).
    pub trend_pct: f64,
    /// Classified trend band.
    pub trend: Trend,
    /// Lookback window in days.
    pub window_days: u32,
    /// Where the point came from ("live" or "mock").
    pub source: String,
    /// Snapshot timestamp.
    pub fetched_at: DateTime<Utc>,
    /// Notes about known approximations (e.g. stainless priced as steel).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Trend bands over the lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    SteepDown,
    MildDown,
    Stable,
    MildUp,
    SteepUp,
}

impl Trend {
    /// Classify a percent change: `<-3` steep-down, `[-3,-1)` mild-down,
    /// `[-1,1]` stable, `(1,3]` mild-up, `>3` steep-up.
    pub fn classify(pct: f64) -> Self {
        if pct < -3.0 {
            Trend::SteepDown
        } else if pct < -1.0 {
            Trend::MildDown
        } else if pct <= 1.0 {
            Trend::Stable
        } else if pct <= 3.0 {
            Trend::MildUp
        } else {
            Trend::SteepUp
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Trend::SteepDown => "steep-down",
            Trend::MildDown => "mild-down",
            Trend::Stable => "stable",
            Trend::MildUp => "mild-up",
            Trend::SteepUp => "steep-up",
        }
    }
}

/// Trait for commodity price sources.
///
/// Implementations must be thread-safe; the orchestrator shares one feed
/// across concurrent estimates.
pub trait CommodityFeed: Send + Sync {
    /// Current price point for a material, with trend over `horizon_days`.
    fn price_for(&self, material: Material, horizon_days: u32) -> Result<CommodityPoint>;

    /// Name of this feed (for traces).
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_bands() {
        assert_eq!(Trend::classify(-5.0), Trend::SteepDown);
        assert_eq!(Trend::classify(-3.0), Trend::MildDown);
        assert_eq!(Trend::classify(-1.0), Trend::Stable);
        assert_eq!(Trend::classify(0.0), Trend::Stable);
        assert_eq!(Trend::classify(1.0), Trend::Stable);
        assert_eq!(Trend::classify(2.5), Trend::MildUp);
        assert_eq!(Trend::classify(3.0), Trend::MildUp);
        assert_eq!(Trend::classify(3.01), Trend::SteepUp);
    }
}
