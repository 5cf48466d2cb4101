//! RainViewer-compatible radar frame list client.

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, checked};
use super::{FrameList, RadarFrame, RadarService};
use crate::error::{GeoError, Result};

#[derive(Debug, Clone)]
pub struct RainViewerClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct WeatherMapsResponse {
    host: String,
    #[serde(default)]
    radar: Option<RadarBlock>,
}

/// Only observed frames; `nowcast` forecasts are left out so the newest
/// frame is the latest observation.
#[derive(Debug, Deserialize)]
struct RadarBlock {
    #[serde(default)]
    past: Vec<FrameEntry>,
}

#[derive(Debug, Deserialize)]
struct FrameEntry {
    time: i64,
    path: String,
}

impl WeatherMapsResponse {
    /// Observed frames sorted by timestamp.
    fn into_frame_list(self) -> Result<FrameList> {
        let mut frames = Vec::new();
        if let Some(radar) = self.radar {
            for entry in radar.past {
                let timestamp = DateTime::from_timestamp(entry.time, 0).ok_or_else(|| {
                    GeoError::ParseFailure(format!("frame time {} out of range", entry.time))
                })?;
                frames.push(RadarFrame {
                    path: entry.path,
                    timestamp,
                });
            }
        }
        frames.sort_by_key(|frame| frame.timestamp);
        frames.dedup_by(|a, b| a.timestamp == b.timestamp);

        Ok(FrameList {
            host: self.host,
            frames,
        })
    }
}

impl RainViewerClient {
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(user_agent)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RadarService for RainViewerClient {
    async fn frames(&self) -> Result<FrameList> {
        let url = format!("{}/public/weather-maps.json", self.base_url);
        debug!("Fetching radar frame list: {}", url);

        let response = self.client.get(&url).send().await?;
        let body: WeatherMapsResponse = checked(response, "radar").await?.json().await?;

        body.into_frame_list()
    }
}
