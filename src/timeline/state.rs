//! Timeline state
//!
//! Frame list, current index, playback flag and the overlay layer that shows
//! the current frame. Pure data; the controller owns the timers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{GeoError, Result};
use crate::services::{FrameList, RadarFrame};

/// Tile size, color scheme and `smooth_snow` options of the radar tiles.
const TILE_SIZE: u32 = 256;
const TILE_COLOR: u32 = 2;
const TILE_OPTIONS: &str = "1_1";

// == Playback State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Stopped,
    Playing,
}

// == Overlay Layer ==
/// The single raster layer showing radar imagery. Frame changes re-point its
/// source instead of replacing the layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlayLayer {
    pub source: Option<String>,
    /// Number of times the source was re-pointed
    pub swaps: u64,
}

impl OverlayLayer {
    fn point_to(&mut self, source: String) {
        if self.source.as_deref() != Some(source.as_str()) {
            self.source = Some(source);
            self.swaps += 1;
        }
    }
}

// == Controls State ==
/// Enabled flags and label of the playback controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlsState {
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub play_enabled: bool,
    pub playing: bool,
    pub timestamp: Option<DateTime<Utc>>,
    pub timestamp_label: Option<String>,
}

// == Reconciled ==
/// How a refresh placed the displayed index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciled {
    /// The display jumped to the newest frame
    pub followed_live: bool,
    pub index: usize,
}

// == Timeline ==
#[derive(Debug, Clone)]
pub struct Timeline {
    host: String,
    frames: Vec<RadarFrame>,
    index: usize,
    state: PlaybackState,
    layer: OverlayLayer,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            host: String::new(),
            frames: Vec::new(),
            index: 0,
            state: PlaybackState::Stopped,
            layer: OverlayLayer::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[RadarFrame] {
        &self.frames
    }

    /// Displayed index, `None` while there are no frames.
    pub fn index(&self) -> Option<usize> {
        (!self.frames.is_empty()).then_some(self.index)
    }

    pub fn current_frame(&self) -> Option<&RadarFrame> {
        self.frames.get(self.index)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn layer(&self) -> &OverlayLayer {
        &self.layer
    }

    pub fn can_play(&self) -> bool {
        self.frames.len() >= 2
    }

    /// Tile URL template of the displayed frame.
    pub fn tile_url(&self) -> Option<String> {
        self.current_frame().map(|frame| {
            format!(
                "{}{}/{}/{{z}}/{{x}}/{{y}}/{}/{}.png",
                self.host, frame.path, TILE_SIZE, TILE_COLOR, TILE_OPTIONS
            )
        })
    }

    pub(crate) fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
    }

    fn show(&mut self, index: usize) -> usize {
        self.index = index;
        if let Some(url) = self.tile_url() {
            self.layer.point_to(url);
        }
        index
    }

    // == Ticker Advance ==
    /// One playback step; wraps to the first frame. Keeps the playback state.
    pub fn advance(&mut self) -> Option<usize> {
        let len = self.frames.len();
        (len > 0).then(|| self.show((self.index + 1) % len))
    }

    // == Manual Controls ==
    pub fn next(&mut self) -> Option<usize> {
        self.state = PlaybackState::Stopped;
        self.advance()
    }

    pub fn prev(&mut self) -> Option<usize> {
        self.state = PlaybackState::Stopped;
        let len = self.frames.len();
        (len > 0).then(|| self.show((self.index + len - 1) % len))
    }

    pub fn seek(&mut self, index: usize) -> Result<usize> {
        if index >= self.frames.len() {
            return Err(GeoError::InvalidRequest(format!(
                "frame {} out of range (0..{})",
                index,
                self.frames.len()
            )));
        }
        self.state = PlaybackState::Stopped;
        Ok(self.show(index))
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    // == Replace ==
    /// Swaps in a freshly fetched frame list.
    ///
    /// An empty list is discarded (`None`). When the newest frame was on
    /// display, or there was nothing before, the display follows the new
    /// newest frame; otherwise the user's index is kept, clamped to the new
    /// length. The playback state is left untouched.
    pub fn replace(&mut self, list: FrameList) -> Option<Reconciled> {
        if list.frames.is_empty() {
            return None;
        }

        let was_live = self.frames.is_empty() || self.index + 1 >= self.frames.len();
        let last = list.frames.len() - 1;

        self.host = list.host;
        self.frames = list.frames;

        let index = if was_live { last } else { self.index.min(last) };
        self.show(index);

        Some(Reconciled {
            followed_live: was_live,
            index,
        })
    }

    pub fn controls(&self) -> ControlsState {
        let many = self.frames.len() > 1;
        let timestamp = self.current_frame().map(|frame| frame.timestamp);
        ControlsState {
            prev_enabled: many,
            next_enabled: many,
            play_enabled: self.can_play(),
            playing: self.state == PlaybackState::Playing,
            timestamp,
            timestamp_label: timestamp.map(|t| t.format("%H:%M UTC").to_string()),
        }
    }
}
