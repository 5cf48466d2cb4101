//! Shared reqwest plumbing for the service adapters.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::CapabilitySource;
use crate::error::{GeoError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Builds a pooled client carrying the configured User-Agent.
pub(crate) fn build_client(user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .pool_max_idle_per_host(4)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(GeoError::from)
}

/// Maps 429 to `RateLimited` and any other non-2xx status to `NetworkUnavailable`.
pub(crate) async fn checked(response: reqwest::Response, service: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(GeoError::RateLimited);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        return Err(GeoError::NetworkUnavailable(format!(
            "{service} returned {status}: {snippet}"
        )));
    }
    Ok(response)
}

// == Capability Source ==
/// Fetches the capability document over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCapabilitySource {
    client: reqwest::Client,
    url: String,
}

impl HttpCapabilitySource {
    pub fn new(url: impl Into<String>, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(user_agent)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CapabilitySource for HttpCapabilitySource {
    async fn fetch(&self) -> Result<String> {
        debug!("Fetching capability document: {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let response = checked(response, "capabilities").await?;
        Ok(response.text().await?)
    }
}
