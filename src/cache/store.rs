//! Spatial Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and lazy TTL expiration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, CacheStats, CachedPlace, LruTracker};
use crate::clock::Clock;

// == Spatial Cache ==
/// Quantized coordinate → resolved place, bounded and time-limited.
pub struct SpatialCache {
    entries: HashMap<CacheKey, CacheEntry>,
    lru: LruTracker<CacheKey>,
    stats: CacheStats,
    capacity: usize,
    ttl_ms: u64,
    grid_deg: f64,
    clock: Arc<dyn Clock>,
}

impl SpatialCache {
    // == Constructor ==
    /// # Arguments
    /// * `capacity` - Maximum number of entries the cache can hold
    /// * `ttl` - Age after which an entry reads as absent
    /// * `grid_deg` - Quantization grid in degrees
    /// * `clock` - Time source for insertion and expiry
    pub fn new(capacity: usize, ttl: Duration, grid_deg: f64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity,
            ttl_ms: ttl.as_millis() as u64,
            grid_deg,
            clock,
        }
    }

    pub fn key_for(&self, lat: f64, lon: f64) -> CacheKey {
        CacheKey::quantize(lat, lon, self.grid_deg)
    }

    // == Get ==
    /// Looks up the cell containing `(lat, lon)`.
    ///
    /// Expired entries are removed and reported as absent. A hit promotes the
    /// entry to most recently used.
    pub fn get(&mut self, lat: f64, lon: f64) -> Option<CachedPlace> {
        let key = self.key_for(lat, lon);
        let now = self.clock.now_ms();

        let Some(entry) = self.entries.get(&key) else {
            self.stats.record_miss();
            return None;
        };

        if entry.is_expired(now, self.ttl_ms) {
            debug!("Spatial cache entry {} expired", key);
            self.entries.remove(&key);
            self.lru.remove(&key);
            self.stats.set_total_entries(self.entries.len());
            self.stats.record_expiration();
            return None;
        }

        let value = entry.value.clone();
        self.stats.record_hit();
        self.lru.touch(&key);
        Some(value)
    }

    // == Put ==
    /// Stores `value` for the cell containing `(lat, lon)`.
    ///
    /// Always overwrites (never merges); afterwards the least recently used
    /// entry is evicted while the cache exceeds its capacity.
    pub fn put(&mut self, lat: f64, lon: f64, value: CachedPlace) {
        let key = self.key_for(lat, lon);
        let entry = CacheEntry::new(value, self.clock.now_ms());

        self.entries.insert(key, entry);
        self.lru.touch(&key);

        while self.entries.len() > self.capacity {
            let Some(evicted) = self.lru.evict_oldest() else {
                break;
            };
            self.entries.remove(&evicted);
            self.stats.record_eviction();
            debug!("Spatial cache evicted {}", evicted);
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for SpatialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialCache")
            .field("entries", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("ttl_ms", &self.ttl_ms)
            .field("grid_deg", &self.grid_deg)
            .finish()
    }
}
