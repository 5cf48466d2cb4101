//! Upstream service seams
//!
//! Each consumed service is a trait so the pipelines can be driven by
//! in-memory fakes in tests and by the HTTP adapters in production.

mod http;
mod nominatim;
mod open_meteo;
mod rainviewer;
mod types;

#[cfg(test)]
pub(crate) mod fakes;

use async_trait::async_trait;

use crate::error::Result;

pub use http::HttpCapabilitySource;
pub use nominatim::NominatimClient;
pub use open_meteo::OpenMeteoClient;
pub use rainviewer::RainViewerClient;
pub use types::{
    next_hour_probability, Address, CurrentConditions, FrameList, PlaceRecord,
    PrecipitationSample, RadarFrame, SearchHit,
};

/// Forward and reverse geocoding.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Reverse lookup at one detail level. `Ok(None)` is a well-formed empty answer.
    async fn reverse(&self, lat: f64, lon: f64, zoom: u8) -> Result<Option<PlaceRecord>>;

    /// Ranked candidates for a free-text query.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// Current conditions and hourly precipitation probability.
#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn current(&self, lat: f64, lon: f64) -> Result<CurrentConditions>;

    async fn hourly_precipitation(&self, lat: f64, lon: f64) -> Result<Vec<PrecipitationSample>>;
}

/// Published radar frames covering the recent past.
#[async_trait]
pub trait RadarService: Send + Sync {
    async fn frames(&self) -> Result<FrameList>;
}

/// Raw capability document of the secondary overlay service.
#[async_trait]
pub trait CapabilitySource: Send + Sync {
    async fn fetch(&self) -> Result<String>;
}
