//! Nominatim-compatible geocoding client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, checked};
use super::{Address, Geocoder, PlaceRecord, SearchHit};
use crate::error::{GeoError, Result};

const SEARCH_LIMIT: &str = "5";

/// Geocoder speaking the Nominatim `/reverse` and `/search` API.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    accept_language: String,
}

// ── Nominatim response types ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "class")]
    category: Option<String>,
    #[serde(rename = "type", default)]
    place_type: Option<String>,
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default, alias = "class")]
    category: Option<String>,
    #[serde(rename = "type", default)]
    place_type: Option<String>,
    #[serde(default)]
    address: Option<Address>,
}

impl ReverseResponse {
    fn into_place(self) -> Option<PlaceRecord> {
        if let Some(error) = self.error {
            debug!("Reverse geocoder reported: {}", error);
            return None;
        }
        Some(PlaceRecord {
            display_name: self.display_name,
            name: self.name,
            address: self.address.unwrap_or_default(),
            category: self.category,
            place_type: self.place_type,
        })
    }
}

impl SearchEntry {
    fn into_hit(self) -> Result<SearchHit> {
        let lat = self
            .lat
            .parse()
            .map_err(|_| GeoError::ParseFailure(format!("bad latitude '{}'", self.lat)))?;
        let lon = self
            .lon
            .parse()
            .map_err(|_| GeoError::ParseFailure(format!("bad longitude '{}'", self.lon)))?;
        Ok(SearchHit {
            lat,
            lon,
            display_name: self.display_name,
            category: self.category,
            place_type: self.place_type,
            address: self.address.unwrap_or_default(),
        })
    }
}

// ── Implementation ────────────────────────────────────────────────────

impl NominatimClient {
    pub fn new(
        base_url: impl Into<String>,
        accept_language: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(user_agent)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            accept_language: accept_language.into(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn reverse(&self, lat: f64, lon: f64, zoom: u8) -> Result<Option<PlaceRecord>> {
        let url = format!("{}/reverse", self.base_url);
        debug!("Reverse lookup lat={} lon={} zoom={}", lat, lon, zoom);

        let response = self
            .client
            .get(&url)
            .header("Accept-Language", &self.accept_language)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("addressdetails", "1".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("zoom", zoom.to_string()),
            ])
            .send()
            .await?;
        let response = checked(response, "geocoder").await?;
        let body: ReverseResponse = response.json().await?;

        Ok(body.into_place())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let url = format!("{}/search", self.base_url);
        debug!("Forward search q={:?}", query);

        let response = self
            .client
            .get(&url)
            .header("Accept-Language", &self.accept_language)
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("limit", SEARCH_LIMIT),
            ])
            .send()
            .await?;
        let response = checked(response, "geocoder").await?;
        let entries: Vec<SearchEntry> = response.json().await?;

        entries.into_iter().map(SearchEntry::into_hit).collect()
    }
}
