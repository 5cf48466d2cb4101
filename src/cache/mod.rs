//! Spatial Cache Module
//!
//! Provides in-memory caching of resolved places keyed by a quantized
//! coordinate, with lazy TTL expiration and LRU eviction.

mod entry;
mod key;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{CacheEntry, CachedPlace};
pub use key::CacheKey;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::SpatialCache;
