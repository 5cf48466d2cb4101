//! Reverse-Resolution Pipeline
//!
//! Coordinates → place, through the spatial cache and then a ladder of
//! geocoder detail levels. Every geocoder answer resumes through the
//! supersession guard, and nothing is cached or returned for a superseded
//! lookup.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{CachedPlace, SpatialCache};
use crate::error::{GeoError, Result};
use crate::services::{Geocoder, PlaceRecord};
use crate::supersession::{Channel, OperationToken, SupersessionController};

// == Resolution ==
/// Outcome of one reverse lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "place", rename_all = "snake_case")]
pub enum Resolution {
    Found(PlaceRecord),
    NotFound,
    /// A newer lookup began before this one settled; nothing was applied.
    Superseded,
}

impl From<CachedPlace> for Resolution {
    fn from(cached: CachedPlace) -> Self {
        match cached {
            CachedPlace::Found(place) => Resolution::Found(place),
            CachedPlace::NotFound => Resolution::NotFound,
        }
    }
}

enum LadderOutcome {
    Found(PlaceRecord),
    Exhausted,
    Superseded,
}

// == Reverse Resolver ==
pub struct ReverseResolver {
    geocoder: Arc<dyn Geocoder>,
    cache: Arc<RwLock<SpatialCache>>,
    supersession: Arc<SupersessionController>,
    ladder: Vec<u8>,
}

impl ReverseResolver {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        cache: Arc<RwLock<SpatialCache>>,
        supersession: Arc<SupersessionController>,
        ladder: Vec<u8>,
    ) -> Self {
        Self {
            geocoder,
            cache,
            supersession,
            ladder,
        }
    }

    // == Resolve ==
    /// Resolves `(lat, lon)` to a place.
    ///
    /// The lookup always supersedes older ones on the reverse-lookup channel,
    /// even when it is answered from the cache, so a slow older lookup can
    /// never overwrite a newer result.
    ///
    /// # Errors
    /// `GeoError::RateLimited` when the geocoder throttles; the ladder is
    /// abandoned on the first such signal.
    pub async fn resolve(&self, lat: f64, lon: f64) -> Result<Resolution> {
        let token = self.supersession.begin(Channel::ReverseLookup);
        self.resolve_for(&token, lat, lon).await
    }

    /// Like [`resolve`](Self::resolve), under a token the caller has begun.
    pub async fn resolve_for(&self, token: &OperationToken, lat: f64, lon: f64) -> Result<Resolution> {
        if let Some(cached) = self.cache.write().await.get(lat, lon) {
            debug!("Reverse lookup lat={} lon={} served from cache", lat, lon);
            if !self.supersession.is_current(token) {
                return Ok(Resolution::Superseded);
            }
            self.supersession.settle(token);
            return Ok(cached.into());
        }

        let outcome = self.run_ladder(token, lat, lon).await;

        // Settlement: currency check and cache write under one lock, no await in between.
        let mut cache = self.cache.write().await;
        if !self.supersession.is_current(token) {
            debug!("Reverse lookup #{} superseded, dropping result", token.generation());
            return Ok(Resolution::Superseded);
        }
        self.supersession.settle(token);

        let resolution = match outcome? {
            LadderOutcome::Superseded => return Ok(Resolution::Superseded),
            LadderOutcome::Found(place) => {
                cache.put(lat, lon, CachedPlace::Found(place.clone()));
                Resolution::Found(place)
            }
            LadderOutcome::Exhausted => {
                info!("No place found at lat={} lon={}", lat, lon);
                cache.put(lat, lon, CachedPlace::NotFound);
                Resolution::NotFound
            }
        };
        Ok(resolution)
    }

    /// Tries each detail level in order until one yields a qualifying place.
    async fn run_ladder(
        &self,
        token: &OperationToken,
        lat: f64,
        lon: f64,
    ) -> Result<LadderOutcome> {
        for &zoom in &self.ladder {
            let attempt = self
                .supersession
                .guard(token, self.geocoder.reverse(lat, lon, zoom))
                .await;

            match attempt {
                None => return Ok(LadderOutcome::Superseded),
                Some(Ok(Some(place))) if place.qualifies() => {
                    debug!("Reverse lookup succeeded at zoom {}", zoom);
                    return Ok(LadderOutcome::Found(place));
                }
                Some(Ok(_)) => debug!("Reverse lookup empty at zoom {}", zoom),
                Some(Err(GeoError::RateLimited)) => {
                    warn!("Geocoder rate limited, abandoning lookup");
                    return Err(GeoError::RateLimited);
                }
                Some(Err(e)) => warn!("Reverse lookup at zoom {} failed: {}", zoom, e),
            }
        }
        Ok(LadderOutcome::Exhausted)
    }
}
