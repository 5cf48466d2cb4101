//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::Serialize;

use crate::services::PlaceRecord;

// == Cached Place ==
/// What a reverse lookup settled on. Both outcomes are cacheable so that
/// "nothing here" is not re-queried on every click within the TTL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "place", rename_all = "snake_case")]
pub enum CachedPlace {
    Found(PlaceRecord),
    NotFound,
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: CachedPlace,
    /// Insertion timestamp (Unix milliseconds)
    pub inserted_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(value: CachedPlace, now_ms: u64) -> Self {
        Self {
            value,
            inserted_at: now_ms,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl_ms`.
    ///
    /// Boundary condition: an entry is expired once its age is greater than or
    /// equal to the TTL.
    pub fn is_expired(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.age_ms(now_ms) >= ttl_ms
    }

    /// Age in milliseconds; a clock that went backwards yields zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.inserted_at)
    }
}
