//! API Routes
//!
//! Configures the Axum router with all orchestrator endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    click_handler, current_view_handler, health_handler, locate_handler, next_handler,
    overlays_handler, pause_handler, play_handler, prev_handler, search_commit_handler,
    search_dismiss_handler, search_input_handler, search_key_handler, search_submit_handler,
    seek_handler, stats_handler, suggestions_handler, timeline_handler, view_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin, so a browser map front-end can drive the API
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/map/click", post(click_handler))
        .route("/map/locate", post(locate_handler))
        .route("/views/current", get(current_view_handler))
        .route("/views/:id", get(view_handler))
        .route("/search/input", post(search_input_handler))
        .route("/search/submit", post(search_submit_handler))
        .route("/search/key", post(search_key_handler))
        .route("/search/commit", post(search_commit_handler))
        .route("/search/dismiss", post(search_dismiss_handler))
        .route("/search/suggestions", get(suggestions_handler))
        .route("/timeline", get(timeline_handler))
        .route("/timeline/play", post(play_handler))
        .route("/timeline/pause", post(pause_handler))
        .route("/timeline/next", post(next_handler))
        .route("/timeline/prev", post(prev_handler))
        .route("/timeline/seek", post(seek_handler))
        .route("/overlays", get(overlays_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
