//! Result view-model and the render target it lives in.
//!
//! Only one result view is open at a time, like a map popup. Weather data
//! arrives later as structured patches addressed by view id; a patch for a
//! view that has since been replaced is dropped without error.

use std::sync::Mutex;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use tracing::debug;

use crate::services::{CurrentConditions, PlaceRecord};

pub type ViewId = u64;

const PLACEHOLDER: &str = "–";

// == Reading ==
/// A weather value that may not have arrived yet. Zero is a real reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Reading {
    Pending,
    Value(f64),
}

impl Reading {
    pub fn is_pending(&self) -> bool {
        matches!(self, Reading::Pending)
    }

    /// `"3.5 °C"`, or the placeholder while pending.
    pub fn label(&self, unit: &str, decimals: usize) -> String {
        match self {
            Reading::Pending => PLACEHOLDER.to_string(),
            Reading::Value(v) => format!("{v:.decimals$} {unit}"),
        }
    }
}

// == Weather Section ==
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherSection {
    pub temperature: Reading,
    pub apparent_temperature: Reading,
    pub wind_speed: Reading,
    pub precipitation_probability: Reading,
}

impl WeatherSection {
    pub fn loading() -> Self {
        Self {
            temperature: Reading::Pending,
            apparent_temperature: Reading::Pending,
            wind_speed: Reading::Pending,
            precipitation_probability: Reading::Pending,
        }
    }

    /// True until the first patch lands.
    pub fn is_loading(&self) -> bool {
        self.temperature.is_pending()
            && self.apparent_temperature.is_pending()
            && self.wind_speed.is_pending()
            && self.precipitation_probability.is_pending()
    }
}

/// Display text for each weather field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherLabels {
    pub temperature: String,
    pub apparent_temperature: String,
    pub wind_speed: String,
    pub precipitation_probability: String,
}

impl WeatherSection {
    pub fn labels(&self) -> WeatherLabels {
        WeatherLabels {
            temperature: self.temperature.label("°C", 1),
            apparent_temperature: self.apparent_temperature.label("°C", 1),
            wind_speed: self.wind_speed.label("km/h", 1),
            precipitation_probability: self.precipitation_probability.label("%", 0),
        }
    }
}

// == Patch ==
/// Structured in-place update of one view. The two variants touch disjoint fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeatherPatch {
    Current(CurrentConditions),
    PrecipitationProbability(f64),
}

// == Result View ==
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub id: ViewId,
    pub lat: f64,
    pub lon: f64,
    pub place: Option<PlaceRecord>,
    pub weather: WeatherSection,
}

impl ResultView {
    /// Heading: the place title, or the coordinates when nothing was found.
    pub fn title(&self) -> String {
        self.place
            .as_ref()
            .and_then(PlaceRecord::title)
            .unwrap_or_else(|| format!("{:.5}, {:.5}", self.lat, self.lon))
    }

    fn apply(&mut self, patch: WeatherPatch) {
        match patch {
            WeatherPatch::Current(current) => {
                if let Some(v) = current.temperature {
                    self.weather.temperature = Reading::Value(v);
                }
                if let Some(v) = current.apparent_temperature {
                    self.weather.apparent_temperature = Reading::Value(v);
                }
                if let Some(v) = current.wind_speed {
                    self.weather.wind_speed = Reading::Value(v);
                }
            }
            WeatherPatch::PrecipitationProbability(p) => {
                self.weather.precipitation_probability = Reading::Value(p);
            }
        }
    }
}

/// Serialized with the derived heading and labels, so a client renders the
/// view without reimplementing the fallbacks.
impl Serialize for ResultView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut view = serializer.serialize_struct("ResultView", 7)?;
        view.serialize_field("id", &self.id)?;
        view.serialize_field("title", &self.title())?;
        view.serialize_field("lat", &self.lat)?;
        view.serialize_field("lon", &self.lon)?;
        view.serialize_field("place", &self.place)?;
        view.serialize_field("weather", &self.weather)?;
        view.serialize_field("labels", &self.weather.labels())?;
        view.end()
    }
}

// == Render Target ==
/// Accepts in-place patches for a rendered view.
pub trait RenderTarget: Send + Sync {
    /// Applies `patch` to view `id`; returns false when that view is gone.
    fn patch(&self, id: ViewId, patch: WeatherPatch) -> bool;
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: ViewId,
    /// Generation of the lookup that opened the newest view
    origin: u64,
    current: Option<ResultView>,
}

impl RegistryState {
    fn render(&mut self, lat: f64, lon: f64, place: Option<PlaceRecord>) -> ResultView {
        self.next_id += 1;
        let view = ResultView {
            id: self.next_id,
            lat,
            lon,
            place,
            weather: WeatherSection::loading(),
        };
        self.current = Some(view.clone());
        view
    }
}

// == View Registry ==
/// Holds the single open result view.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    state: Mutex<RegistryState>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // == Open ==
    /// Renders a new view with a loading weather section, replacing the open one.
    #[cfg(test)]
    pub(crate) fn open(&self, lat: f64, lon: f64, place: Option<PlaceRecord>) -> ResultView {
        self.lock().render(lat, lon, place)
    }

    /// Opens a view for the lookup with generation `origin`, unless a view
    /// from a later-started lookup is already showing.
    pub fn open_from(
        &self,
        origin: u64,
        lat: f64,
        lon: f64,
        place: Option<PlaceRecord>,
    ) -> Option<ResultView> {
        let mut state = self.lock();
        if origin < state.origin {
            debug!("View from lookup #{} arrived after #{}, skipped", origin, state.origin);
            return None;
        }
        state.origin = origin;
        Some(state.render(lat, lon, place))
    }

    pub fn current(&self) -> Option<ResultView> {
        self.lock().current.clone()
    }

    /// The view with `id`, if it is still open.
    pub fn get(&self, id: ViewId) -> Option<ResultView> {
        self.lock().current.clone().filter(|view| view.id == id)
    }
}

impl RenderTarget for ViewRegistry {
    fn patch(&self, id: ViewId, patch: WeatherPatch) -> bool {
        let mut state = self.lock();
        match state.current.as_mut() {
            Some(view) if view.id == id => {
                view.apply(patch);
                true
            }
            _ => {
                debug!("View {} no longer open, dropping patch", id);
                false
            }
        }
    }
}
