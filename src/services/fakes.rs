//! In-memory service fakes for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::error::GeoError;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap()
}

// == Geocoder ==
#[derive(Default)]
pub(crate) struct FakeGeocoder {
    reverse_by_zoom: Mutex<HashMap<u8, Result<Option<PlaceRecord>>>>,
    reverse_calls: Mutex<Vec<u8>>,
    latencies: Mutex<VecDeque<Duration>>,
    hits: Mutex<Vec<SearchHit>>,
    search_error: Mutex<Option<GeoError>>,
    search_calls: Mutex<Vec<String>>,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reverse(self, zoom: u8, result: Result<Option<PlaceRecord>>) -> Self {
        lock(&self.reverse_by_zoom).insert(zoom, result);
        self
    }

    /// Each successive call sleeps for the next queued latency.
    pub fn with_latencies(self, latencies: &[u64]) -> Self {
        lock(&self.latencies).extend(latencies.iter().map(|ms| Duration::from_millis(*ms)));
        self
    }

    pub fn with_hits(self, hits: Vec<SearchHit>) -> Self {
        *lock(&self.hits) = hits;
        self
    }

    pub fn with_search_error(self, error: GeoError) -> Self {
        *lock(&self.search_error) = Some(error);
        self
    }

    pub fn reverse_calls(&self) -> Vec<u8> {
        lock(&self.reverse_calls).clone()
    }

    pub fn search_calls(&self) -> Vec<String> {
        lock(&self.search_calls).clone()
    }

    async fn wait_latency(&self) {
        let latency = lock(&self.latencies).pop_front();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64, zoom: u8) -> Result<Option<PlaceRecord>> {
        lock(&self.reverse_calls).push(zoom);
        self.wait_latency().await;
        lock(&self.reverse_by_zoom)
            .get(&zoom)
            .cloned()
            .unwrap_or(Ok(None))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        lock(&self.search_calls).push(query.to_string());
        self.wait_latency().await;
        if let Some(error) = lock(&self.search_error).clone() {
            return Err(error);
        }
        Ok(lock(&self.hits).clone())
    }
}

// == Weather ==
pub(crate) struct FakeWeather {
    pub current: Result<CurrentConditions>,
    pub current_delay: Duration,
    pub hourly: Result<Vec<PrecipitationSample>>,
    pub hourly_delay: Duration,
}

impl Default for FakeWeather {
    fn default() -> Self {
        Self {
            current: Err(GeoError::NetworkUnavailable("unset".to_string())),
            current_delay: Duration::ZERO,
            hourly: Ok(Vec::new()),
            hourly_delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl WeatherService for FakeWeather {
    async fn current(&self, _lat: f64, _lon: f64) -> Result<CurrentConditions> {
        tokio::time::sleep(self.current_delay).await;
        self.current.clone()
    }

    async fn hourly_precipitation(&self, _lat: f64, _lon: f64) -> Result<Vec<PrecipitationSample>> {
        tokio::time::sleep(self.hourly_delay).await;
        self.hourly.clone()
    }
}

// == Radar ==
#[derive(Default)]
pub(crate) struct FakeRadar {
    responses: Mutex<VecDeque<Result<FrameList>>>,
    latencies: Mutex<VecDeque<Duration>>,
}

impl FakeRadar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Result<FrameList>) {
        lock(&self.responses).push_back(response);
    }

    pub fn push_latency(&self, ms: u64) {
        lock(&self.latencies).push_back(Duration::from_millis(ms));
    }
}

#[async_trait]
impl RadarService for FakeRadar {
    async fn frames(&self) -> Result<FrameList> {
        let latency = lock(&self.latencies).pop_front();
        let response = lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Ok(FrameList::default()));
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        response
    }
}

// == Capabilities ==
pub(crate) struct FakeCapabilities(pub Result<String>);

#[async_trait]
impl CapabilitySource for FakeCapabilities {
    async fn fetch(&self) -> Result<String> {
        self.0.clone()
    }
}

/// Frames `t0 + i*10min` with paths `/v2/radar/{i}`.
pub(crate) fn frame_list(count: usize) -> FrameList {
    let start = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    FrameList {
        host: "https://tiles.example".to_string(),
        frames: (0..count)
            .map(|i| RadarFrame {
                path: format!("/v2/radar/{i}"),
                timestamp: start + chrono::Duration::minutes(10 * i as i64),
            })
            .collect(),
    }
}

pub(crate) fn place(name: &str) -> PlaceRecord {
    PlaceRecord {
        display_name: Some(name.to_string()),
        ..Default::default()
    }
}
