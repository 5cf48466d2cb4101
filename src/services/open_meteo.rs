//! Open-Meteo-compatible weather client.
//!
//! Two separate calls: a small `current=` request that answers quickly, and
//! the heavier hourly series carrying precipitation probability.

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, checked};
use super::{CurrentConditions, PrecipitationSample, WeatherService};
use crate::error::{GeoError, Result};

const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

// ── Open-Meteo response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: CurrentBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    #[serde(rename = "temperature_2m", default)]
    temperature: Option<f64>,
    #[serde(default)]
    apparent_temperature: Option<f64>,
    #[serde(rename = "wind_speed_10m", default)]
    wind_speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HourlyResponse {
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
}

impl HourlyBlock {
    /// Zips the parallel arrays; times are UTC because the request asks for it.
    fn into_samples(self) -> Result<Vec<PrecipitationSample>> {
        self.time
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let naive = NaiveDateTime::parse_from_str(raw, HOURLY_TIME_FORMAT)
                    .map_err(|e| GeoError::ParseFailure(format!("hourly time '{raw}': {e}")))?;
                Ok(PrecipitationSample {
                    time: Utc.from_utc_datetime(&naive),
                    probability: self.precipitation_probability.get(i).copied().flatten(),
                })
            })
            .collect()
    }
}

// ── Implementation ────────────────────────────────────────────────────

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(user_agent)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WeatherService for OpenMeteoClient {
    async fn current(&self, lat: f64, lon: f64) -> Result<CurrentConditions> {
        let url = format!("{}/v1/forecast", self.base_url);
        debug!("Fetching current conditions lat={} lon={}", lat, lon);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                (
                    "current",
                    "temperature_2m,apparent_temperature,wind_speed_10m".to_string(),
                ),
            ])
            .send()
            .await?;
        let body: CurrentResponse = checked(response, "weather").await?.json().await?;

        Ok(CurrentConditions {
            temperature: body.current.temperature,
            apparent_temperature: body.current.apparent_temperature,
            wind_speed: body.current.wind_speed,
        })
    }

    async fn hourly_precipitation(&self, lat: f64, lon: f64) -> Result<Vec<PrecipitationSample>> {
        let url = format!("{}/v1/forecast", self.base_url);
        debug!("Fetching hourly precipitation lat={} lon={}", lat, lon);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("hourly", "precipitation_probability".to_string()),
                ("timezone", "UTC".to_string()),
                ("forecast_days", "2".to_string()),
            ])
            .send()
            .await?;
        let body: HourlyResponse = checked(response, "weather").await?.json().await?;

        body.hourly.into_samples()
    }
}
