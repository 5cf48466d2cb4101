//! Radar overlay timeline
//!
//! - `state`: frame list, displayed index and the overlay layer
//! - `controller`: playback ticker and supersession-guarded refresh
//! - `discovery`: secondary overlay from a WMTS capability document

mod controller;
mod discovery;
mod state;

pub use controller::{RefreshOutcome, TimelineController, TimelineSnapshot};
pub use discovery::{discover_overlay, parse_capabilities, CapabilityLayer, SecondaryOverlay};
pub use state::{ControlsState, OverlayLayer, PlaybackState, Reconciled, Timeline};
