//! Cache Key Module
//!
//! Quantizes coordinates onto a fixed grid so that nearby clicks share one lookup.

use std::fmt;

// == Cache Key ==
/// A coordinate pair snapped to the grid, stored as integer cell indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat_cell: i64,
    lon_cell: i64,
}

impl CacheKey {
    /// Rounds each coordinate independently to the nearest multiple of `grid_deg`.
    pub fn quantize(lat: f64, lon: f64, grid_deg: f64) -> Self {
        Self {
            lat_cell: (lat / grid_deg).round() as i64,
            lon_cell: (lon / grid_deg).round() as i64,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.lat_cell, self.lon_cell)
    }
}
