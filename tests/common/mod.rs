//! Shared fixtures for the integration tests: canned upstream services and
//! an app wired to them.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{body::Body, Router};
use chrono::{DateTime, Duration as ChronoDuration};
use serde_json::Value;

use geo_overlay::api::{create_router, AppState};
use geo_overlay::clock::{Clock, ManualClock};
use geo_overlay::services::{
    Address, CapabilitySource, CurrentConditions, FrameList, Geocoder, PlaceRecord,
    PrecipitationSample, RadarFrame, RadarService, SearchHit, WeatherService,
};
use geo_overlay::{Config, GeoError, MapSession, Result, Services};

// == Stub Services ==

#[derive(Default)]
pub struct StubGeocoder {
    pub reverse: Mutex<HashMap<u8, Result<Option<PlaceRecord>>>>,
    pub hits: Mutex<Vec<SearchHit>>,
    pub reverse_calls: Mutex<Vec<u8>>,
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64, zoom: u8) -> Result<Option<PlaceRecord>> {
        self.reverse_calls.lock().unwrap().push(zoom);
        self.reverse
            .lock()
            .unwrap()
            .get(&zoom)
            .cloned()
            .unwrap_or(Ok(None))
    }

    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
        Ok(self.hits.lock().unwrap().clone())
    }
}

pub struct StubWeather;

#[async_trait]
impl WeatherService for StubWeather {
    async fn current(&self, _lat: f64, _lon: f64) -> Result<CurrentConditions> {
        Ok(CurrentConditions {
            temperature: Some(14.5),
            apparent_temperature: Some(13.0),
            wind_speed: Some(7.2),
        })
    }

    async fn hourly_precipitation(&self, _lat: f64, _lon: f64) -> Result<Vec<PrecipitationSample>> {
        let now = ManualClock::default().now();
        Ok(vec![
            PrecipitationSample {
                time: now - ChronoDuration::hours(1),
                probability: Some(90.0),
            },
            PrecipitationSample {
                time: now + ChronoDuration::minutes(30),
                probability: Some(40.0),
            },
        ])
    }
}

#[derive(Default)]
pub struct StubRadar {
    pub responses: Mutex<VecDeque<Result<FrameList>>>,
}

#[async_trait]
impl RadarService for StubRadar {
    async fn frames(&self) -> Result<FrameList> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(FrameList::default()))
    }
}

pub struct StubCapabilities(pub Result<String>);

#[async_trait]
impl CapabilitySource for StubCapabilities {
    async fn fetch(&self) -> Result<String> {
        self.0.clone()
    }
}

// == Test App ==

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub geocoder: Arc<StubGeocoder>,
    pub radar: Arc<StubRadar>,
    pub clock: Arc<ManualClock>,
}

pub fn test_app() -> TestApp {
    test_app_with(StubCapabilities(Err(GeoError::NetworkUnavailable(
        "offline".to_string(),
    ))))
}

pub fn test_app_with(capabilities: StubCapabilities) -> TestApp {
    let geocoder = Arc::new(StubGeocoder::default());
    let radar = Arc::new(StubRadar::default());
    let clock = Arc::new(ManualClock::default());
    let services = Services {
        geocoder: geocoder.clone(),
        weather: Arc::new(StubWeather),
        radar: radar.clone(),
        capabilities: Arc::new(capabilities),
    };
    let state = AppState::new(MapSession::new(&Config::default(), services, clock.clone()));
    TestApp {
        router: create_router(state.clone()),
        state,
        geocoder,
        radar,
        clock,
    }
}

pub async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn place(name: &str) -> PlaceRecord {
    PlaceRecord {
        display_name: Some(format!("{name}, Zürich, Schweiz")),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

pub fn hit(name: &str, lat: f64, lon: f64) -> SearchHit {
    SearchHit {
        lat,
        lon,
        display_name: name.to_string(),
        category: Some("place".to_string()),
        place_type: Some("city".to_string()),
        address: Address {
            city: Some(name.to_string()),
            ..Default::default()
        },
    }
}

/// `count` frames ten minutes apart.
pub fn frames(count: usize) -> FrameList {
    let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    FrameList {
        host: "https://tilecache.example".to_string(),
        frames: (0..count)
            .map(|i| RadarFrame {
                path: format!("/v2/radar/{}", 1_700_000_000 + 600 * i),
                timestamp: start + ChronoDuration::minutes(10 * i as i64),
            })
            .collect(),
    }
}
