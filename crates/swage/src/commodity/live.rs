//! Live commodity feed over an external market data HTTP API.
//!
//! The upstream quotes USD per metric ton; conversion to €/kg uses a fixed
//! configured rate: `eur_per_kg = usd_per_ton * rate / 1000`.

use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::{Result, SwageError};
use crate::normalize::Material;

use super::feed::{CommodityFeed, CommodityPoint, Trend};

/// Default market data endpoint.
const DEFAULT_BASE_URL: &str = "https://api.metalquote.example/v1/latest";

/// Commodity fetches get a shorter timeout than model calls.
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Live market source keyed by a family→symbol mapping.
pub struct LiveFeed {
    client: Client,
    base_url: String,
    api_key: String,
    usd_eur_rate: f64,
}

impl LiveFeed {
    /// Create a live feed with an API key and USD→EUR conversion rate.
    pub fn new(api_key: impl Into<String>, usd_eur_rate: f64) -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| SwageError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            usd_eur_rate,
        })
    }

    /// Override the endpoint (self-hosted mirrors, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Upstream symbol for a material family.
    ///
    /// Stainless is priced from the steel symbol and brass from copper:
    /// pragmatic approximations, both recorded on the returned point.
    fn symbol_for(material: Material) -> Option<&'static str> {
        match material {
            Material::Steel | Material::CastIron => Some("STEEL"),
            Material::StainlessA2 | Material::StainlessA4 => Some("STEEL"),
            Material::Aluminum => Some("ALUMINUM"),
            Material::Brass | Material::Copper => Some("COPPER"),
            Material::Titanium => Some("TITANIUM"),
            Material::Zinc => Some("ZINC"),
            Material::Plastic => None,
        }
    }

    fn approximation_note(material: Material) -> Option<String> {
        match material {
            Material::StainlessA2 | Material::StainlessA4 => {
                Some("stainless priced from the STEEL symbol (approximation)".to_string())
            }
            Material::Brass => Some("brass priced from the COPPER symbol".to_string()),
            Material::CastIron => Some("cast iron priced from the STEEL symbol".to_string()),
            _ => None,
        }
    }
}

impl CommodityFeed for LiveFeed {
    fn price_for(&self, material: Material, horizon_days: u32) -> Result<CommodityPoint> {
        let symbol = Self::symbol_for(material).ok_or_else(|| {
            SwageError::Commodity(format!("no market symbol for {}", material))
        })?;

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("symbol", symbol),
                ("window_days", &horizon_days.to_string()),
            ])
            .send()
            .map_err(|e| SwageError::Commodity(format!("fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SwageError::Commodity(format!(
                "upstream returned {}",
                response.status()
            )));
        }

        let quote: Quote = response
            .json()
            .map_err(|e| SwageError::Commodity(format!("bad quote body: {}", e)))?;

        let price_eur_per_kg = quote.price_usd_per_ton * self.usd_eur_rate / 1000.0;
        let mut notes = Vec::new();
        if let Some(note) = Self::approximation_note(material) {
            notes.push(note);
        }

        Ok(CommodityPoint {
            material_family: material.family().to_string(),
            price_eur_per_kg,
            trend_pct: quote.change_pct,
            trend: Trend::classify(quote.change_pct),
            window_days: horizon_days,
            source: "live".to_string(),
            fetched_at: Utc::now(),
            notes,
        })
    }

    fn name(&self) -> &str {
        "live"
    }
}

/// Upstream quote body.
#[derive(Debug, Deserialize)]
struct Quote {
    price_usd_per_ton: f64,
    #[serde(default)]
    change_pct: f64,
}
