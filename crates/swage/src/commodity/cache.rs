//! Read-mostly snapshot cache around a commodity feed.
//!
//! One estimate never needs more than one point per material family, but
//! concurrent estimates hammer the same few symbols. Reads take the shared
//! lock; a miss or stale entry takes the writer lock for that refresh only.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::normalize::Material;

use super::feed::{CommodityFeed, CommodityPoint};

struct CacheEntry {
    point: CommodityPoint,
    fetched: Instant,
}

/// Caching wrapper; entries expire after `max_age`.
pub struct CachedFeed<F: CommodityFeed> {
    inner: F,
    max_age: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl<F: CommodityFeed> CachedFeed<F> {
    /// Wrap a feed with a per-family snapshot cache.
    pub fn new(inner: F, max_age: Duration) -> Self {
        Self {
            inner,
            max_age,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<F: CommodityFeed> CommodityFeed for CachedFeed<F> {
    fn price_for(&self, material: Material, horizon_days: u32) -> Result<CommodityPoint> {
        let key = format!("{}:{}", material.family(), horizon_days);

        if let Ok(entries) = self.entries.read() {
            if let Some(entry) = entries.get(&key) {
                if entry.fetched.elapsed() < self.max_age {
                    return Ok(entry.point.clone());
                }
            }
        }

        let point = self.inner.price_for(material, horizon_days)?;
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key,
                CacheEntry {
                    point: point.clone(),
                    fetched: Instant::now(),
                },
            );
        }
        Ok(point)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
