//! Request DTOs for the orchestrator API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::search::NavKey;

/// Request body for map events (POST /map/click, POST /map/locate)
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CoordinatesRequest {
    pub lat: f64,
    pub lon: f64,
}

/// Request body for search text (POST /search/input, POST /search/submit)
#[derive(Debug, Clone, Deserialize)]
pub struct SearchTextRequest {
    /// Current contents of the search field
    #[serde(default)]
    pub text: String,
}

/// Request body for keyboard navigation (POST /search/key)
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct KeyRequest {
    pub key: NavKey,
}

/// Request body for POST /search/commit
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChooseRequest {
    /// Position in the suggestion list
    pub index: usize,
}

/// Request body for POST /timeline/seek
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SeekRequest {
    pub index: usize,
}
