//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Radar refresh: re-fetches the radar frame list at configured intervals

mod radar_refresh;

pub use radar_refresh::spawn_radar_refresh_task;
