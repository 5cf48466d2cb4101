//! Configuration Module
//!
//! Handles loading and managing orchestrator configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Orchestrator configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of places the spatial cache holds
    pub cache_capacity: usize,
    /// Spatial cache TTL in seconds
    pub cache_ttl_secs: u64,
    /// Grid resolution in degrees used to quantize cache keys
    pub cache_grid_deg: f64,
    /// Reverse geocoding detail levels, tried in order
    pub reverse_zoom_ladder: Vec<u8>,
    /// Deadline for the fast current-conditions call in milliseconds
    pub fast_weather_timeout_ms: u64,
    /// Radar playback tick in milliseconds
    pub playback_interval_ms: u64,
    /// Radar frame list refresh interval in seconds
    pub radar_refresh_secs: u64,
    /// Keystroke silence required before a search fires, in milliseconds
    pub search_debounce_ms: u64,
    /// Minimum query length for debounced searches
    pub search_min_chars: usize,
    /// Window after a programmatic map move during which clicks are ignored
    pub suppress_window_ms: u64,
    /// Nominatim-compatible geocoder base URL
    pub geocoder_url: String,
    /// Open-Meteo-compatible weather base URL
    pub weather_url: String,
    /// RainViewer-compatible radar API base URL
    pub radar_url: String,
    /// WMTS capability document for the secondary overlay
    pub capabilities_url: String,
    /// Layer identifier looked up in the capability document
    pub secondary_layer: String,
    /// Accept-Language header sent to the geocoder
    pub accept_language: String,
    /// User-Agent sent to all upstream services
    pub user_agent: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_CAPACITY` - Spatial cache entries (default: 200)
    /// - `CACHE_TTL_SECS` - Spatial cache TTL (default: 86400)
    /// - `CACHE_GRID_DEG` - Cache grid resolution (default: 0.0005, about 55 m)
    /// - `REVERSE_ZOOM_LADDER` - Comma separated zoom levels (default: 14,12,10,18,3)
    /// - `FAST_WEATHER_TIMEOUT_MS` - Current conditions deadline (default: 1200)
    /// - `PLAYBACK_INTERVAL_MS` - Radar playback tick (default: 500)
    /// - `RADAR_REFRESH_SECS` - Radar frame refresh (default: 300)
    /// - `SEARCH_DEBOUNCE_MS` - Search debounce (default: 350)
    /// - `SEARCH_MIN_CHARS` - Minimum query length (default: 3)
    /// - `SUPPRESS_WINDOW_MS` - Click suppression after programmatic moves (default: 300)
    /// - `GEOCODER_URL`, `WEATHER_URL`, `RADAR_URL`, `CAPABILITIES_URL` - upstream endpoints
    /// - `SECONDARY_LAYER` - capability layer identifier
    /// - `ACCEPT_LANGUAGE`, `USER_AGENT` - request headers
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            cache_capacity: parse_var("CACHE_CAPACITY", defaults.cache_capacity),
            cache_ttl_secs: parse_var("CACHE_TTL_SECS", defaults.cache_ttl_secs),
            cache_grid_deg: parse_var("CACHE_GRID_DEG", defaults.cache_grid_deg),
            reverse_zoom_ladder: env::var("REVERSE_ZOOM_LADDER")
                .ok()
                .and_then(|v| parse_ladder(&v))
                .unwrap_or(defaults.reverse_zoom_ladder),
            fast_weather_timeout_ms: parse_var(
                "FAST_WEATHER_TIMEOUT_MS",
                defaults.fast_weather_timeout_ms,
            ),
            playback_interval_ms: parse_var("PLAYBACK_INTERVAL_MS", defaults.playback_interval_ms),
            radar_refresh_secs: parse_var("RADAR_REFRESH_SECS", defaults.radar_refresh_secs),
            search_debounce_ms: parse_var("SEARCH_DEBOUNCE_MS", defaults.search_debounce_ms),
            search_min_chars: parse_var("SEARCH_MIN_CHARS", defaults.search_min_chars),
            suppress_window_ms: parse_var("SUPPRESS_WINDOW_MS", defaults.suppress_window_ms),
            geocoder_url: env::var("GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            weather_url: env::var("WEATHER_URL").unwrap_or(defaults.weather_url),
            radar_url: env::var("RADAR_URL").unwrap_or(defaults.radar_url),
            capabilities_url: env::var("CAPABILITIES_URL").unwrap_or(defaults.capabilities_url),
            secondary_layer: env::var("SECONDARY_LAYER").unwrap_or(defaults.secondary_layer),
            accept_language: env::var("ACCEPT_LANGUAGE").unwrap_or(defaults.accept_language),
            user_agent: env::var("USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fast_weather_timeout(&self) -> Duration {
        Duration::from_millis(self.fast_weather_timeout_ms)
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback_interval_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn suppress_window(&self) -> Duration {
        Duration::from_millis(self.suppress_window_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_capacity: 200,
            cache_ttl_secs: 24 * 60 * 60,
            cache_grid_deg: 0.0005,
            reverse_zoom_ladder: vec![14, 12, 10, 18, 3],
            fast_weather_timeout_ms: 1200,
            playback_interval_ms: 500,
            radar_refresh_secs: 300,
            search_debounce_ms: 350,
            search_min_chars: 3,
            suppress_window_ms: 300,
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            weather_url: "https://api.open-meteo.com".to_string(),
            radar_url: "https://api.rainviewer.com".to_string(),
            capabilities_url:
                "https://wmts.geo.admin.ch/EPSG/3857/1.0.0/WMTSCapabilities.xml".to_string(),
            secondary_layer: "ch.meteoschweiz.ogd-radar-precip".to_string(),
            accept_language: "de".to_string(),
            user_agent: "geo_overlay/0.1 (map client)".to_string(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses `"14,12,10"` into a ladder; rejects empty or malformed lists.
fn parse_ladder(raw: &str) -> Option<Vec<u8>> {
    let ladder: Vec<u8> = raw
        .split(',')
        .map(|part| part.trim().parse().ok())
        .collect::<Option<Vec<u8>>>()?;
    if ladder.is_empty() {
        None
    } else {
        Some(ladder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_capacity, 200);
        assert_eq!(config.cache_ttl_secs, 86_400);
        assert_eq!(config.reverse_zoom_ladder, vec![14, 12, 10, 18, 3]);
        assert_eq!(config.fast_weather_timeout(), Duration::from_millis(1200));
        assert_eq!(config.playback_interval(), Duration::from_millis(500));
        assert_eq!(config.radar_refresh_secs, 300);
        assert_eq!(config.search_min_chars, 3);
        assert_eq!(config.suppress_window(), Duration::from_millis(300));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("REVERSE_ZOOM_LADDER");
        env::remove_var("SEARCH_DEBOUNCE_MS");

        let config = Config::from_env();
        assert_eq!(config.cache_capacity, 200);
        assert_eq!(config.reverse_zoom_ladder, vec![14, 12, 10, 18, 3]);
        assert_eq!(config.search_debounce(), Duration::from_millis(350));
    }

    #[test]
    fn test_parse_ladder() {
        assert_eq!(parse_ladder("16, 10,5"), Some(vec![16, 10, 5]));
        assert_eq!(parse_ladder("16,x"), None);
        assert_eq!(parse_ladder(""), None);
    }
}
