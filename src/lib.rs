//! Geo Overlay - map client core
//!
//! Resolves clicks, device location and typed queries into place
//! information through a spatial cache and a geocoder fallback ladder,
//! enriches the shown result with weather as it arrives, and drives a
//! periodically refreshed radar timeline.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod enrich;
pub mod error;
pub mod models;
pub mod resolve;
pub mod search;
pub mod services;
pub mod session;
pub mod supersession;
pub mod tasks;
pub mod timeline;
pub mod view;

pub use api::AppState;
pub use config::Config;
pub use error::{GeoError, Result};
pub use session::{MapOutcome, MapSession, Services};
pub use tasks::spawn_radar_refresh_task;
