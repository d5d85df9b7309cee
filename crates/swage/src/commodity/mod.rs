//! Commodity price feed: current €/kg per material family plus a trend
//! classification over a horizon.
//!
//! The trait seam lets the orchestrator run against a live market source, a
//! cached wrapper, or the deterministic mock, without caring which. Feed
//! failures are never fatal to an estimate; callers fall back to the
//! estimator's own price.

mod cache;
mod feed;
mod live;
mod mock;

pub use cache::CachedFeed;
pub use feed::{CommodityFeed, CommodityPoint, Trend};
pub use live::LiveFeed;
pub use mock::MockFeed;
