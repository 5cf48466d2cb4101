//! Map Session
//!
//! One instance of every orchestrator component, wired together, plus the
//! boundary operations a map front-end drives: clicks, device location,
//! search, suggestion commits and the radar timeline.

use std::sync::{Arc, RwLock as StdRwLock};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{CacheStats, SpatialCache};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::enrich::Enricher;
use crate::error::{GeoError, Result};
use crate::resolve::{ReverseResolver, Resolution};
use crate::search::{KeyOutcome, NavKey, SearchOutcome, SearchPipeline, SearchSnapshot};
use crate::services::{
    CapabilitySource, Geocoder, HttpCapabilitySource, NominatimClient, OpenMeteoClient,
    PlaceRecord, RadarService, RainViewerClient, SearchHit, WeatherService,
};
use crate::supersession::{Channel, SupersessionController, SuppressWindow};
use crate::timeline::{discover_overlay, SecondaryOverlay, TimelineController};
use crate::view::{ResultView, ViewRegistry};

// == Services ==
/// The upstream services a session talks to.
#[derive(Clone)]
pub struct Services {
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherService>,
    pub radar: Arc<dyn RadarService>,
    pub capabilities: Arc<dyn CapabilitySource>,
}

impl Services {
    /// HTTP adapters for the configured endpoints.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            geocoder: Arc::new(NominatimClient::new(
                config.geocoder_url.as_str(),
                config.accept_language.as_str(),
                &config.user_agent,
            )?),
            weather: Arc::new(OpenMeteoClient::new(config.weather_url.as_str(), &config.user_agent)?),
            radar: Arc::new(RainViewerClient::new(config.radar_url.as_str(), &config.user_agent)?),
            capabilities: Arc::new(HttpCapabilitySource::new(
                config.capabilities_url.as_str(),
                &config.user_agent,
            )?),
        })
    }
}

// == Map Outcome ==
/// What a click or location event led to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "view", rename_all = "snake_case")]
pub enum MapOutcome {
    /// A result view was opened; weather arrives by patch.
    Shown(ResultView),
    /// Fired by a programmatic map move; ignored.
    Suppressed,
    /// A newer map event started before this one settled.
    Superseded,
}

/// A key press, and what committing a suggestion led to.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyResult {
    pub outcome: KeyOutcome,
    pub committed: Option<MapOutcome>,
}

// == Map Session ==
pub struct MapSession {
    cache: Arc<RwLock<SpatialCache>>,
    supersession: Arc<SupersessionController>,
    resolver: ReverseResolver,
    enricher: Enricher,
    views: Arc<ViewRegistry>,
    timeline: Arc<TimelineController>,
    search: SearchPipeline,
    suppress: SuppressWindow,
    capabilities: Arc<dyn CapabilitySource>,
    secondary_layer: String,
    overlay: StdRwLock<Option<SecondaryOverlay>>,
}

impl MapSession {
    pub fn new(config: &Config, services: Services, clock: Arc<dyn Clock>) -> Self {
        let supersession = Arc::new(SupersessionController::new());
        let cache = Arc::new(RwLock::new(SpatialCache::new(
            config.cache_capacity,
            config.cache_ttl(),
            config.cache_grid_deg,
            clock.clone(),
        )));
        let views = Arc::new(ViewRegistry::new());

        Self {
            resolver: ReverseResolver::new(
                services.geocoder.clone(),
                cache.clone(),
                supersession.clone(),
                config.reverse_zoom_ladder.clone(),
            ),
            enricher: Enricher::new(
                services.weather,
                views.clone(),
                clock.clone(),
                config.fast_weather_timeout(),
            ),
            timeline: Arc::new(TimelineController::new(
                services.radar,
                supersession.clone(),
                config.playback_interval(),
            )),
            search: SearchPipeline::new(
                services.geocoder,
                supersession.clone(),
                config.search_debounce(),
                config.search_min_chars,
            ),
            suppress: SuppressWindow::new(config.suppress_window(), clock),
            capabilities: services.capabilities,
            secondary_layer: config.secondary_layer.clone(),
            overlay: StdRwLock::new(None),
            cache,
            supersession,
            views,
        }
    }

    /// A session on HTTP adapters and the system clock.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config, Services::from_config(config)?, Arc::new(SystemClock)))
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn timeline(&self) -> &Arc<TimelineController> {
        &self.timeline
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    // == Click ==
    /// A user click on the map.
    ///
    /// # Errors
    /// `InvalidRequest` for coordinates off the globe, `RateLimited` when the
    /// geocoder throttles.
    pub async fn click(&self, lat: f64, lon: f64) -> Result<MapOutcome> {
        validate_coordinates(lat, lon)?;
        if self.suppress.is_active() {
            debug!("Click at lat={} lon={} suppressed after map move", lat, lon);
            return Ok(MapOutcome::Suppressed);
        }
        self.resolve_and_show(lat, lon).await
    }

    // == Locate ==
    /// Device location fix. The map flies there, so the window is armed first.
    pub async fn locate(&self, lat: f64, lon: f64) -> Result<MapOutcome> {
        validate_coordinates(lat, lon)?;
        self.suppress.arm();
        self.resolve_and_show(lat, lon).await
    }

    async fn resolve_and_show(&self, lat: f64, lon: f64) -> Result<MapOutcome> {
        let token = self.supersession.begin(Channel::ReverseLookup);

        let place = match self.resolver.resolve_for(&token, lat, lon).await? {
            Resolution::Superseded => return Ok(MapOutcome::Superseded),
            Resolution::Found(place) => Some(place),
            Resolution::NotFound => None,
        };

        Ok(self.show(token.generation(), lat, lon, place))
    }

    fn show(
        &self,
        origin: u64,
        lat: f64,
        lon: f64,
        place: Option<PlaceRecord>,
    ) -> MapOutcome {
        match self.views.open_from(origin, lat, lon, place) {
            Some(view) => {
                self.enricher.enrich(view.id, lat, lon);
                MapOutcome::Shown(view)
            }
            None => MapOutcome::Superseded,
        }
    }

    // == Commit ==
    /// Opens the view for a chosen suggestion without a reverse lookup.
    ///
    /// Supersedes any pending reverse lookup and arms the suppress window
    /// before the map pans to the hit.
    pub fn commit(&self, hit: &SearchHit) -> Result<MapOutcome> {
        validate_coordinates(hit.lat, hit.lon)?;
        let token = self.supersession.begin(Channel::ReverseLookup);
        self.supersession.settle(&token);
        self.suppress.arm();

        info!("Committed search hit {:?}", hit.display_name);
        Ok(self.show(token.generation(), hit.lat, hit.lon, Some(hit.to_place())))
    }

    // == Search ==
    pub async fn search_input(&self, text: &str) -> Result<SearchOutcome> {
        self.search.input(text).await
    }

    pub async fn search_submit(&self, text: &str) -> Result<SearchOutcome> {
        self.search.submit(text).await
    }

    /// Keyboard on the suggestion list; Enter commits.
    pub fn search_key(&self, key: NavKey) -> Result<KeyResult> {
        let outcome = self.search.key(key);
        let committed = match &outcome {
            KeyOutcome::Commit(hit) => Some(self.commit(hit)?),
            _ => None,
        };
        Ok(KeyResult { outcome, committed })
    }

    /// Pointer selection on the suggestion list.
    ///
    /// # Errors
    /// `NotFound` when the list holds no entry at `index`.
    pub fn search_choose(&self, index: usize) -> Result<MapOutcome> {
        let hit = self
            .search
            .choose(index)
            .ok_or_else(|| GeoError::NotFound(format!("no suggestion at index {index}")))?;
        self.commit(&hit)
    }

    pub fn search_dismiss(&self) {
        self.search.dismiss();
    }

    pub fn search_snapshot(&self) -> SearchSnapshot {
        self.search.snapshot()
    }

    // == Secondary Overlay ==
    /// Looks up the secondary overlay; keeps the previous one on failure.
    pub async fn discover_overlay(&self) -> Option<SecondaryOverlay> {
        let found = discover_overlay(self.capabilities.as_ref(), &self.secondary_layer).await;
        if let Some(overlay) = &found {
            *self.overlay.write().unwrap_or_else(|e| e.into_inner()) = Some(overlay.clone());
        }
        found
    }

    pub fn secondary_overlay(&self) -> Option<SecondaryOverlay> {
        self.overlay.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

fn validate_coordinates(lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(GeoError::InvalidRequest(format!(
            "coordinates out of range: lat={lat} lon={lon}"
        )));
    }
    Ok(())
}
