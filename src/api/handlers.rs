//! API Handlers
//!
//! HTTP request handlers for each orchestrator endpoint. Handlers only
//! translate between JSON and the session's boundary operations.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::config::Config;
use crate::error::{GeoError, Result};
use crate::models::{
    ChooseRequest, CoordinatesRequest, HealthResponse, KeyRequest, KeyResponse, OverlaysResponse,
    SearchResponse, SearchTextRequest, SeekRequest, StatsResponse,
};
use crate::search::SearchSnapshot;
use crate::session::{MapOutcome, MapSession};
use crate::timeline::TimelineSnapshot;
use crate::view::{ResultView, ViewId};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The orchestrator behind every endpoint
    pub session: Arc<MapSession>,
}

impl AppState {
    /// Creates a new AppState around the given session.
    pub fn new(session: MapSession) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    /// Creates a new AppState from configuration, on the HTTP service adapters.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(MapSession::from_config(config)?))
    }
}

// == Map ==

/// Handler for POST /map/click
pub async fn click_handler(
    State(state): State<AppState>,
    Json(req): Json<CoordinatesRequest>,
) -> Result<Json<MapOutcome>> {
    Ok(Json(state.session.click(req.lat, req.lon).await?))
}

/// Handler for POST /map/locate
pub async fn locate_handler(
    State(state): State<AppState>,
    Json(req): Json<CoordinatesRequest>,
) -> Result<Json<MapOutcome>> {
    Ok(Json(state.session.locate(req.lat, req.lon).await?))
}

// == Views ==

/// Handler for GET /views/current
pub async fn current_view_handler(State(state): State<AppState>) -> Result<Json<ResultView>> {
    state
        .session
        .views()
        .current()
        .map(Json)
        .ok_or_else(|| GeoError::NotFound("no open view".to_string()))
}

/// Handler for GET /views/:id
///
/// Views are replaced by the next map event, so older ids answer 404.
pub async fn view_handler(
    State(state): State<AppState>,
    Path(id): Path<ViewId>,
) -> Result<Json<ResultView>> {
    state
        .session
        .views()
        .get(id)
        .map(Json)
        .ok_or_else(|| GeoError::NotFound(format!("view {id} is not open")))
}

// == Search ==

/// Handler for POST /search/input
pub async fn search_input_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchTextRequest>,
) -> Result<Json<SearchResponse>> {
    let outcome = state.session.search_input(&req.text).await?;
    Ok(Json(SearchResponse {
        outcome,
        search: state.session.search_snapshot(),
    }))
}

/// Handler for POST /search/submit
pub async fn search_submit_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchTextRequest>,
) -> Result<Json<SearchResponse>> {
    let outcome = state.session.search_submit(&req.text).await?;
    Ok(Json(SearchResponse {
        outcome,
        search: state.session.search_snapshot(),
    }))
}

/// Handler for POST /search/key
pub async fn search_key_handler(
    State(state): State<AppState>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<KeyResponse>> {
    let result = state.session.search_key(req.key)?;
    Ok(Json(KeyResponse::new(result, state.session.search_snapshot())))
}

/// Handler for POST /search/commit
pub async fn search_commit_handler(
    State(state): State<AppState>,
    Json(req): Json<ChooseRequest>,
) -> Result<Json<MapOutcome>> {
    Ok(Json(state.session.search_choose(req.index)?))
}

/// Handler for POST /search/dismiss
pub async fn search_dismiss_handler(State(state): State<AppState>) -> Json<SearchSnapshot> {
    state.session.search_dismiss();
    Json(state.session.search_snapshot())
}

/// Handler for GET /search/suggestions
pub async fn suggestions_handler(State(state): State<AppState>) -> Json<SearchSnapshot> {
    Json(state.session.search_snapshot())
}

// == Timeline ==

/// Handler for GET /timeline
pub async fn timeline_handler(State(state): State<AppState>) -> Json<TimelineSnapshot> {
    Json(state.session.timeline().snapshot())
}

/// Handler for POST /timeline/play
pub async fn play_handler(State(state): State<AppState>) -> Json<TimelineSnapshot> {
    Json(state.session.timeline().play())
}

/// Handler for POST /timeline/pause
pub async fn pause_handler(State(state): State<AppState>) -> Json<TimelineSnapshot> {
    Json(state.session.timeline().pause())
}

/// Handler for POST /timeline/next
pub async fn next_handler(State(state): State<AppState>) -> Json<TimelineSnapshot> {
    Json(state.session.timeline().next())
}

/// Handler for POST /timeline/prev
pub async fn prev_handler(State(state): State<AppState>) -> Json<TimelineSnapshot> {
    Json(state.session.timeline().prev())
}

/// Handler for POST /timeline/seek
pub async fn seek_handler(
    State(state): State<AppState>,
    Json(req): Json<SeekRequest>,
) -> Result<Json<TimelineSnapshot>> {
    Ok(Json(state.session.timeline().seek(req.index)?))
}

// == Overlays ==

/// Handler for GET /overlays
pub async fn overlays_handler(State(state): State<AppState>) -> Json<OverlaysResponse> {
    let timeline = state.session.timeline().snapshot();
    Json(OverlaysResponse::new(
        &timeline,
        state.session.secondary_overlay(),
    ))
}

// == Service ==

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.session.cache_stats().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
