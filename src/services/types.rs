//! Records produced by the upstream services.
//!
//! Every field the services may omit is an `Option`; nothing here relies on
//! zero or empty values meaning "unknown".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Address ==
/// Structured address parts of a geocoding result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
}

impl Address {
    fn fields(&self) -> [&Option<String>; 10] {
        [
            &self.road,
            &self.house_number,
            &self.suburb,
            &self.village,
            &self.town,
            &self.city,
            &self.county,
            &self.state,
            &self.country,
            &self.postcode,
        ]
    }

    /// True if at least one field carries non-blank text.
    pub fn has_any(&self) -> bool {
        self.fields()
            .iter()
            .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// Most specific locality name available.
    pub fn locality(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
            .or(self.suburb.as_deref())
    }

    /// "Road 12" style street line.
    pub fn street_line(&self) -> Option<String> {
        match (self.road.as_deref(), self.house_number.as_deref()) {
            (Some(road), Some(number)) => Some(format!("{road} {number}")),
            (Some(road), None) => Some(road.to_string()),
            _ => None,
        }
    }
}

// == Place Record ==
/// A resolved place. Immutable once received; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub display_name: Option<String>,
    pub name: Option<String>,
    pub address: Address,
    pub category: Option<String>,
    pub place_type: Option<String>,
}

impl PlaceRecord {
    /// A reverse lookup attempt counts as successful when it carries a
    /// non-empty display name or any populated address field.
    pub fn qualifies(&self) -> bool {
        self.display_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
            || self.address.has_any()
    }

    /// Short heading for the result view.
    pub fn title(&self) -> Option<String> {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.address.street_line())
            .or_else(|| {
                self.display_name
                    .as_deref()
                    .and_then(|d| d.split(',').next())
                    .map(|s| s.trim().to_string())
            })
    }
}

// == Search Hit ==
/// One forward geocoding candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
    pub category: Option<String>,
    pub place_type: Option<String>,
    #[serde(default)]
    pub address: Address,
}

impl SearchHit {
    /// Builds the place record shown when this hit is committed; the hit
    /// already carries structured fields, so no reverse lookup is needed.
    pub fn to_place(&self) -> PlaceRecord {
        PlaceRecord {
            display_name: Some(self.display_name.clone()),
            name: None,
            address: self.address.clone(),
            category: self.category.clone(),
            place_type: self.place_type.clone(),
        }
    }
}

// == Weather ==
/// Fast "current conditions" summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub temperature: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// One entry of the hourly precipitation probability series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrecipitationSample {
    pub time: DateTime<Utc>,
    pub probability: Option<f64>,
}

/// Picks the first sample at or after `now`.
pub fn next_hour_probability(samples: &[PrecipitationSample], now: DateTime<Utc>) -> Option<f64> {
    samples
        .iter()
        .find(|sample| sample.time >= now)
        .and_then(|sample| sample.probability)
}

// == Radar ==
/// One timestamped radar raster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RadarFrame {
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

/// Frame list as published by the radar service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameList {
    /// Tile host prefix for frame paths
    pub host: String,
    pub frames: Vec<RadarFrame>,
}
