//! API Module
//!
//! HTTP handlers and routing for the orchestrator REST API.
//!
//! # Endpoints
//! - `POST /map/click`, `POST /map/locate` - Map events
//! - `GET /views/current`, `GET /views/:id` - Result views
//! - `POST /search/{input,submit,key,dismiss}`, `GET /search/suggestions` - Search
//! - `GET /timeline`, `POST /timeline/{play,pause,next,prev,seek}` - Radar playback
//! - `GET /overlays` - Overlay tile templates
//! - `GET /stats` - Spatial cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
