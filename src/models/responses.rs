//! Response DTOs for the orchestrator API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::search::{KeyOutcome, SearchOutcome, SearchSnapshot};
use crate::session::{KeyResult, MapOutcome};
use crate::timeline::{SecondaryOverlay, TimelineSnapshot};

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Entries found expired on read
    pub expirations: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for search input and submit
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub outcome: SearchOutcome,
    pub search: SearchSnapshot,
}

/// Response body for POST /search/key
#[derive(Debug, Clone, Serialize)]
pub struct KeyResponse {
    /// highlighted, commit, cleared or ignored
    pub action: &'static str,
    pub highlight: Option<usize>,
    /// Set when Enter committed a suggestion
    pub committed: Option<MapOutcome>,
    pub search: SearchSnapshot,
}

impl KeyResponse {
    pub fn new(result: KeyResult, search: SearchSnapshot) -> Self {
        let (action, highlight) = match result.outcome {
            KeyOutcome::Highlighted(index) => ("highlighted", Some(index)),
            KeyOutcome::Commit(_) => ("commit", None),
            KeyOutcome::Cleared => ("cleared", None),
            KeyOutcome::Ignored => ("ignored", None),
        };
        Self {
            action,
            highlight,
            committed: result.committed,
            search,
        }
    }
}

/// Response body for GET /overlays
#[derive(Debug, Clone, Serialize)]
pub struct OverlaysResponse {
    /// Tile template of the radar frame on display
    pub radar: Option<String>,
    pub radar_timestamp: Option<String>,
    /// Absent when discovery failed
    pub secondary: Option<SecondaryOverlay>,
}

impl OverlaysResponse {
    pub fn new(timeline: &TimelineSnapshot, secondary: Option<SecondaryOverlay>) -> Self {
        Self {
            radar: timeline.tile_url.clone(),
            radar_timestamp: timeline.controls.timestamp.map(|t| t.to_rfc3339()),
            secondary,
        }
    }
}
