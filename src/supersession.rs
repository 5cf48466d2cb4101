//! Request Supersession Controller
//!
//! Keeps exactly one authoritative operation per logical channel. Beginning a
//! new operation cancels the previous one (best effort) and, more importantly,
//! makes it non-current: every resumption point checks currency before it
//! touches shared state, so a late answer is dropped even if the transport
//! ignored the cancellation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Notify;
use tracing::debug;

use crate::clock::Clock;

// == Channel ==
/// Independent supersession domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    ReverseLookup,
    Search,
    RadarRefresh,
}

#[derive(Debug, Default)]
struct CancelSignal {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

// == Operation Token ==
/// Handle for one in-flight operation on a channel.
#[derive(Debug, Clone)]
pub struct OperationToken {
    channel: Channel,
    generation: u64,
    signal: Arc<CancelSignal>,
}

impl OperationToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token has been superseded.
    pub async fn cancelled(&self) {
        let notified = self.signal.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

#[derive(Debug, Default)]
struct ChannelState {
    issued: u64,
    live: Option<(u64, Arc<CancelSignal>)>,
}

// == Supersession Controller ==
#[derive(Debug, Default)]
pub struct SupersessionController {
    channels: Mutex<HashMap<Channel, ChannelState>>,
}

impl SupersessionController {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Channel, ChannelState>> {
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }

    // == Begin ==
    /// Issues a fresh token for `channel`, cancelling the live one if any.
    pub fn begin(&self, channel: Channel) -> OperationToken {
        let mut channels = self.lock();
        let state = channels.entry(channel).or_default();

        if let Some((previous, signal)) = state.live.take() {
            debug!("Superseding {:?} operation #{}", channel, previous);
            signal.cancel();
        }

        state.issued += 1;
        let signal = Arc::new(CancelSignal::default());
        state.live = Some((state.issued, signal.clone()));

        OperationToken {
            channel,
            generation: state.issued,
            signal,
        }
    }

    // == Is Current ==
    /// True only for the most recently begun, not yet settled token.
    pub fn is_current(&self, token: &OperationToken) -> bool {
        self.lock()
            .get(&token.channel)
            .and_then(|state| state.live.as_ref())
            .is_some_and(|(generation, _)| *generation == token.generation)
    }

    // == Settle ==
    /// Releases the live slot once `token`'s operation has applied its result.
    pub fn settle(&self, token: &OperationToken) {
        let mut channels = self.lock();
        if let Some(state) = channels.get_mut(&token.channel) {
            if state
                .live
                .as_ref()
                .is_some_and(|(generation, _)| *generation == token.generation)
            {
                state.live = None;
            }
        }
    }

    // == Guard ==
    /// Awaits `operation` unless `token` is superseded first.
    ///
    /// Returns `None` when the token was cancelled while waiting or is no
    /// longer current at the moment the operation resumes.
    pub async fn guard<F: Future>(&self, token: &OperationToken, operation: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = token.cancelled() => None,
            output = operation => self.is_current(token).then_some(output),
        }
    }
}

// == Suppress Window ==
/// Time-based guard against reverse lookups fired by programmatic map moves.
pub struct SuppressWindow {
    until_ms: AtomicU64,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl SuppressWindow {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            until_ms: AtomicU64::new(0),
            window,
            clock,
        }
    }

    /// Opens (or extends) the window starting now.
    pub fn arm(&self) {
        let until = self.clock.now_ms() + self.window.as_millis() as u64;
        self.until_ms.fetch_max(until, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.clock.now_ms() < self.until_ms.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SuppressWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuppressWindow")
            .field("window", &self.window)
            .field("until_ms", &self.until_ms.load(Ordering::SeqCst))
            .finish()
    }
}
