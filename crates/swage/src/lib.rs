//! # Swage
//!
//! LLM-assisted cost, mass and CO₂ estimation for fastener-class parts.
//!
//! A free-form part description like `ISO 4028-10.9-(ZN-NI)-M10×1,25×45` is
//! normalized deterministically, enriched through schema-validated model
//! calls, and cross-checked against a physics kernel that can override any
//! number the model gets wrong. The output is an auditable [`PartEstimate`]
//! with a calculation trace and an explicit confidence grade.
//!
//! ## Quick start
//!
//! ```no_run
//! use swage::{EstimateRequest, Swage, SwageConfig};
//!
//! let swage = Swage::new(SwageConfig::default())?;
//! let estimate = swage.estimate(&EstimateRequest::new("DIN933 M8×25 8.8 verzinkt", 10_000))?;
//! println!("{:.4} EUR/unit ({})", estimate.total_unit_cost_eur.unwrap_or(0.0), estimate.confidence.label());
//! # Ok::<(), swage::SwageError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`normalize`]: dimension grammar and material rule chain, pure.
//! - [`physics`]: cylinder/family mass model, pure.
//! - [`commodity`]: market price feeds (live, mock, cached).
//! - [`llm`]: transport abstraction, layered JSON extraction, schema checks.
//! - [`estimator`], [`planner`], [`supplier`]: the model-backed steps.
//! - [`co2`]: emission and CBAM arithmetic, pure.
//! - [`Swage`]: the orchestrator tying the steps together.

pub mod co2;
pub mod commodity;
pub mod confidence;
pub mod error;
pub mod estimator;
pub mod llm;
pub mod normalize;
pub mod physics;
pub mod planner;
pub mod supplier;
mod swage;

pub use co2::{co2_footprint, Co2Report, TransportMode};
pub use commodity::{CommodityFeed, CommodityPoint, Trend};
pub use confidence::Confidence;
pub use error::{ApiErrorKind, Result, SwageError};
pub use estimator::{MaterialEstimate, MaterialEstimator};
pub use normalize::{normalize, Material, NormalizedPart, PartFamily};
pub use planner::{CostBreakdown, FabricationPlan, Process, ProcessPlanner, Regime};
pub use supplier::{
    CompetencyProfile, NegotiationPlan, RiskLevel, SupplierProfile, SupplierRating,
};
pub use swage::{
    EstimateRequest, Geometry, MaterialDetails, PartEstimate, Swage, SwageConfig,
};
