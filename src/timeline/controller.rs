//! Overlay Timeline Controller
//!
//! Owns the shared timeline, the playback ticker and the periodic refresh.
//! Refreshes run on their own supersession channel, so an older refresh that
//! answers late never replaces a newer frame list.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::{ControlsState, OverlayLayer, PlaybackState, Timeline};
use crate::error::Result;
use crate::services::{RadarFrame, RadarService};
use crate::supersession::{Channel, SupersessionController};

// == Refresh Outcome ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Replaced { followed_live: bool, frames: usize },
    /// The service answered with no frames; the old list stays.
    Empty,
    Superseded,
}

// == Snapshot ==
/// Read-only view of the timeline for callers outside the lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSnapshot {
    pub state: PlaybackState,
    pub index: Option<usize>,
    pub frames: Vec<RadarFrame>,
    pub tile_url: Option<String>,
    pub layer: OverlayLayer,
    pub controls: ControlsState,
}

impl From<&Timeline> for TimelineSnapshot {
    fn from(timeline: &Timeline) -> Self {
        Self {
            state: timeline.state(),
            index: timeline.index(),
            frames: timeline.frames().to_vec(),
            tile_url: timeline.tile_url(),
            layer: timeline.layer().clone(),
            controls: timeline.controls(),
        }
    }
}

// == Timeline Controller ==
pub struct TimelineController {
    radar: Arc<dyn RadarService>,
    supersession: Arc<SupersessionController>,
    timeline: Arc<Mutex<Timeline>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    interval: Duration,
}

impl TimelineController {
    pub fn new(
        radar: Arc<dyn RadarService>,
        supersession: Arc<SupersessionController>,
        interval: Duration,
    ) -> Self {
        Self {
            radar,
            supersession,
            timeline: Arc::new(Mutex::new(Timeline::new())),
            ticker: Mutex::new(None),
            interval,
        }
    }

    fn timeline(&self) -> MutexGuard<'_, Timeline> {
        lock(&self.timeline)
    }

    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot::from(&*self.timeline())
    }

    /// Tile URL template of the frame on display.
    pub fn tile_url(&self) -> Option<String> {
        self.timeline().tile_url()
    }

    // == Refresh ==
    /// Fetches the frame list and reconciles it with the displayed index.
    ///
    /// # Errors
    /// The radar service failure, when this refresh is still current. The
    /// previous frame list stays on display either way.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let token = self.supersession.begin(Channel::RadarRefresh);

        let Some(fetched) = self.supersession.guard(&token, self.radar.frames()).await else {
            debug!("Radar refresh #{} superseded in flight", token.generation());
            return Ok(RefreshOutcome::Superseded);
        };

        let mut timeline = self.timeline();
        if !self.supersession.is_current(&token) {
            return Ok(RefreshOutcome::Superseded);
        }
        self.supersession.settle(&token);

        let list = fetched?;
        let frames = list.frames.len();
        match timeline.replace(list) {
            Some(reconciled) => {
                info!(
                    "Radar timeline refreshed: {} frames, showing {}{}",
                    frames,
                    reconciled.index,
                    if reconciled.followed_live { " (live)" } else { "" }
                );
                Ok(RefreshOutcome::Replaced {
                    followed_live: reconciled.followed_live,
                    frames,
                })
            }
            None => {
                warn!("Radar service returned no frames, keeping previous list");
                Ok(RefreshOutcome::Empty)
            }
        }
    }

    // == Playback ==
    /// Starts the ticker. No-op with fewer than two frames or when already playing.
    pub fn play(&self) -> TimelineSnapshot {
        let mut timeline = self.timeline();
        if !timeline.can_play() {
            debug!("Play ignored with {} frame(s)", timeline.len());
            return TimelineSnapshot::from(&*timeline);
        }
        timeline.set_state(PlaybackState::Playing);

        let mut ticker = lock(&self.ticker);
        if ticker.as_ref().map_or(true, JoinHandle::is_finished) {
            *ticker = Some(self.spawn_ticker());
        }
        TimelineSnapshot::from(&*timeline)
    }

    pub fn pause(&self) -> TimelineSnapshot {
        self.manual(Timeline::pause)
    }

    pub fn next(&self) -> TimelineSnapshot {
        self.manual(|timeline| {
            timeline.next();
        })
    }

    pub fn prev(&self) -> TimelineSnapshot {
        self.manual(|timeline| {
            timeline.prev();
        })
    }

    /// Jumps to `index`. An out-of-range index leaves playback untouched.
    pub fn seek(&self, index: usize) -> Result<TimelineSnapshot> {
        let mut timeline = self.timeline();
        timeline.seek(index)?;
        self.stop_ticker();
        Ok(TimelineSnapshot::from(&*timeline))
    }

    /// Applies a manual move and stops the ticker.
    fn manual(&self, apply: impl FnOnce(&mut Timeline)) -> TimelineSnapshot {
        let mut timeline = self.timeline();
        apply(&mut timeline);
        self.stop_ticker();
        TimelineSnapshot::from(&*timeline)
    }

    // Lock order: timeline, then ticker.
    fn stop_ticker(&self) {
        if let Some(handle) = lock(&self.ticker).take() {
            handle.abort();
        }
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let timeline = self.timeline.clone();
        let period = self.interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                if !tick(&timeline) {
                    debug!("Playback ticker stopped");
                    break;
                }
            }
        })
    }
}

impl Drop for TimelineController {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

/// One playback step; false once playback has stopped.
fn tick(timeline: &Mutex<Timeline>) -> bool {
    let mut timeline = lock(timeline);
    if timeline.state() != PlaybackState::Playing {
        return false;
    }
    timeline.advance();
    true
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoError;
    use crate::services::fakes::{frame_list, FakeRadar};

    fn controller(radar: Arc<FakeRadar>) -> TimelineController {
        TimelineController::new(
            radar,
            Arc::new(SupersessionController::new()),
            Duration::from_millis(500),
        )
    }

    async fn loaded(count: usize) -> (TimelineController, Arc<FakeRadar>) {
        let radar = Arc::new(FakeRadar::new());
        radar.push(Ok(frame_list(count)));
        let controller = controller(radar.clone());
        controller.refresh().await.unwrap();
        (controller, radar)
    }

    #[tokio::test]
    async fn test_refresh_auto_follows_live() {
        let (controller, radar) = loaded(3).await;
        assert_eq!(controller.snapshot().index, Some(2));

        radar.push(Ok(frame_list(4)));
        let outcome = controller.refresh().await.unwrap();

        assert_eq!(
            outcome,
            RefreshOutcome::Replaced {
                followed_live: true,
                frames: 4
            }
        );
        assert_eq!(controller.snapshot().index, Some(3));
    }

    #[tokio::test]
    async fn test_refresh_preserves_user_position() {
        let (controller, radar) = loaded(3).await;
        controller.seek(0).unwrap();

        radar.push(Ok(frame_list(4)));
        controller.refresh().await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.index, Some(0));
        assert_eq!(snapshot.frames.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_and_failed_refresh_keep_frames() {
        let (controller, radar) = loaded(3).await;

        radar.push(Ok(frame_list(0)));
        assert_eq!(controller.refresh().await.unwrap(), RefreshOutcome::Empty);

        radar.push(Err(GeoError::NetworkUnavailable("down".to_string())));
        assert!(controller.refresh().await.is_err());

        assert_eq!(controller.snapshot().frames.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_refresh_is_superseded() {
        let radar = Arc::new(FakeRadar::new());
        radar.push_latency(1_000);
        radar.push(Ok(frame_list(2)));
        radar.push(Ok(frame_list(5)));
        let controller = Arc::new(controller(radar));

        let slow = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        controller.refresh().await.unwrap();

        assert_eq!(slow.await.unwrap().unwrap(), RefreshOutcome::Superseded);
        assert_eq!(controller.snapshot().frames.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_advances_and_wraps() {
        let (controller, _) = loaded(3).await;

        assert_eq!(controller.play().state, PlaybackState::Playing);
        tokio::time::sleep(Duration::from_millis(1_100)).await;

        // Started on the last frame: two ticks wrap through 0 to 1.
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.index, Some(1));
        assert!(snapshot.controls.playing);

        let paused = controller.pause();
        assert_eq!(paused.state, PlaybackState::Stopped);
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(controller.snapshot().index, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_does_not_interrupt_playback() {
        let (controller, radar) = loaded(3).await;
        controller.play();

        radar.push(Ok(frame_list(4)));
        controller.refresh().await.unwrap();

        assert_eq!(controller.snapshot().state, PlaybackState::Playing);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(controller.snapshot().state, PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_play_needs_two_frames() {
        let (controller, _) = loaded(1).await;
        assert_eq!(controller.play().state, PlaybackState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_move_stops_playback() {
        let (controller, _) = loaded(3).await;
        controller.play();

        let snapshot = controller.prev();

        assert_eq!(snapshot.state, PlaybackState::Stopped);
        assert_eq!(snapshot.index, Some(1));
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(controller.snapshot().index, Some(1));
    }

    #[tokio::test]
    async fn test_seek_out_of_range_is_rejected() {
        let (controller, _) = loaded(3).await;
        assert!(matches!(controller.seek(7), Err(GeoError::InvalidRequest(_))));
    }
}
