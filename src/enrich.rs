//! Progressive Enrichment Pipeline
//!
//! Two independent stages patch an already rendered view: the fast current
//! conditions call under a short deadline, and the slower hourly series for
//! the next-hour precipitation probability. Neither waits for the other.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::services::{next_hour_probability, WeatherService};
use crate::view::{RenderTarget, ViewId, WeatherPatch};

// == Enrich Handle ==
/// The two spawned stages; each yields whether it patched the view.
#[derive(Debug)]
pub struct EnrichHandle {
    pub current: JoinHandle<bool>,
    pub precipitation: JoinHandle<bool>,
}

impl EnrichHandle {
    /// Waits for both stages. A panicked stage counts as "not patched".
    pub async fn finished(self) -> (bool, bool) {
        let current = self.current.await.unwrap_or(false);
        let precipitation = self.precipitation.await.unwrap_or(false);
        (current, precipitation)
    }
}

// == Enricher ==
#[derive(Clone)]
pub struct Enricher {
    weather: Arc<dyn WeatherService>,
    target: Arc<dyn RenderTarget>,
    clock: Arc<dyn Clock>,
    fast_timeout: Duration,
}

impl Enricher {
    pub fn new(
        weather: Arc<dyn WeatherService>,
        target: Arc<dyn RenderTarget>,
        clock: Arc<dyn Clock>,
        fast_timeout: Duration,
    ) -> Self {
        Self {
            weather,
            target,
            clock,
            fast_timeout,
        }
    }

    // == Enrich ==
    /// Starts both stages for view `view` and returns immediately.
    pub fn enrich(&self, view: ViewId, lat: f64, lon: f64) -> EnrichHandle {
        let current = {
            let this = self.clone();
            tokio::spawn(async move { this.current_stage(view, lat, lon).await })
        };
        let precipitation = {
            let this = self.clone();
            tokio::spawn(async move { this.precipitation_stage(view, lat, lon).await })
        };
        EnrichHandle {
            current,
            precipitation,
        }
    }

    async fn current_stage(&self, view: ViewId, lat: f64, lon: f64) -> bool {
        match tokio::time::timeout(self.fast_timeout, self.weather.current(lat, lon)).await {
            Ok(Ok(conditions)) => self.target.patch(view, WeatherPatch::Current(conditions)),
            Ok(Err(e)) => {
                debug!("Current conditions unavailable for view {}: {}", view, e);
                false
            }
            Err(_) => {
                debug!(
                    "Current conditions not ready within {:?} for view {}",
                    self.fast_timeout, view
                );
                false
            }
        }
    }

    async fn precipitation_stage(&self, view: ViewId, lat: f64, lon: f64) -> bool {
        let samples = match self.weather.hourly_precipitation(lat, lon).await {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Hourly precipitation unavailable for view {}: {}", view, e);
                return false;
            }
        };

        match next_hour_probability(&samples, self.clock.now()) {
            Some(probability) => self
                .target
                .patch(view, WeatherPatch::PrecipitationProbability(probability)),
            None => {
                debug!("No upcoming precipitation sample for view {}", view);
                false
            }
        }
    }
}
