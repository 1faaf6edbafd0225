//! Virtual-time response window for smarthub.
//!
//! The hub never tells the client "that's everything". Instead, a Timer
//! device broadcasts `Tick` records carrying the server's virtual clock,
//! and the client keeps polling until enough virtual time has passed since
//! it started listening. [`ResponseWindow`] is that clock.
//!
//! There is no wall-clock timeout anywhere in here: a hub that stops
//! sending ticks keeps the window open, and the session only ends when the
//! hub answers with a non-200 status.
//!
//! # Integration
//!
//! One window per polling round:
//!
//! ```ignore
//! let mut window = ResponseWindow::new(config.window.clone());
//! loop {
//!     let response = transport.post(body).await?;
//!     if let Some(ts) = latest_tick(&response) {
//!         if window.observe(ts).is_closed() {
//!             break;
//!         }
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How long a polling round listens, in server milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Virtual milliseconds between the first tick of a round and the
    /// tick that closes it. Default: 300.
    pub window_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_ms: Self::DEFAULT_WINDOW_MS,
        }
    }
}

impl WindowConfig {
    pub const DEFAULT_WINDOW_MS: u64 = 300;

    /// Smallest usable window. A zero window would close on the very tick
    /// that opens it.
    pub const MIN_WINDOW_MS: u64 = 1;

    pub fn with_window(window_ms: u64) -> Self {
        Self { window_ms }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`ResponseWindow::new`].
    pub fn validated(mut self) -> Self {
        if self.window_ms < Self::MIN_WINDOW_MS {
            warn!(
                window_ms = self.window_ms,
                min = Self::MIN_WINDOW_MS,
                "window_ms below minimum, clamping"
            );
            self.window_ms = Self::MIN_WINDOW_MS;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Where a round is in its virtual-time window.
///
/// ```text
///   AwaitingFirstTick ──(tick)──→ Accumulating ──(elapsed ≥ window)──→ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// No tick seen yet; the clock hasn't started.
    AwaitingFirstTick,
    /// Ticks are arriving but the window is still open.
    Accumulating { elapsed: u64 },
    /// Enough virtual time has passed. Stop polling.
    Closed { elapsed: u64 },
}

impl WindowState {
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed { .. })
    }

    /// Virtual milliseconds since the first tick, if the clock has started.
    pub fn elapsed(self) -> Option<u64> {
        match self {
            Self::AwaitingFirstTick => None,
            Self::Accumulating { elapsed } | Self::Closed { elapsed } => Some(elapsed),
        }
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Counters kept across the lifetime of a window (including resets).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowMetrics {
    /// Tick timestamps fed to [`ResponseWindow::observe`].
    pub ticks_observed: u64,
    /// Ticks that went backwards relative to the previous one.
    pub regressions: u64,
    /// Windows that reached [`WindowState::Closed`].
    pub windows_closed: u64,
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// A virtual clock over server Tick timestamps.
#[derive(Debug, Clone)]
pub struct ResponseWindow {
    config: WindowConfig,
    /// Timestamp of the first tick since the last reset.
    start: Option<u64>,
    /// Most recent tick timestamp.
    latest: Option<u64>,
    /// Whether `windows_closed` has been bumped for the current window.
    counted_close: bool,
    metrics: WindowMetrics,
}

impl ResponseWindow {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config: config.validated(),
            start: None,
            latest: None,
            counted_close: false,
            metrics: WindowMetrics::default(),
        }
    }

    pub fn with_window(window_ms: u64) -> Self {
        Self::new(WindowConfig::with_window(window_ms))
    }

    /// Feeds one tick timestamp and returns the resulting state.
    ///
    /// The first tick starts the clock. Later ticks move `latest`, even
    /// backwards: the server's clock is authoritative, so a regression is
    /// logged and followed rather than ignored.
    pub fn observe(&mut self, timestamp: u64) -> WindowState {
        self.metrics.ticks_observed += 1;

        match (self.start, self.latest) {
            (None, _) => {
                trace!(timestamp, "window opened");
                self.start = Some(timestamp);
            }
            (Some(_), Some(latest)) if timestamp < latest => {
                warn!(timestamp, latest, "tick went backwards");
                self.metrics.regressions += 1;
            }
            _ => {}
        }
        self.latest = Some(timestamp);

        let state = self.state();
        if let WindowState::Closed { elapsed } = state {
            if !self.counted_close {
                self.counted_close = true;
                self.metrics.windows_closed += 1;
                trace!(elapsed, window_ms = self.config.window_ms, "window closed");
            }
        }
        state
    }

    /// The current state, without feeding a tick.
    pub fn state(&self) -> WindowState {
        let (Some(start), Some(latest)) = (self.start, self.latest) else {
            return WindowState::AwaitingFirstTick;
        };
        let elapsed = latest.saturating_sub(start);
        if elapsed >= self.config.window_ms {
            WindowState::Closed { elapsed }
        } else {
            WindowState::Accumulating { elapsed }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state().is_closed()
    }

    /// Timestamp of the tick that opened the window.
    pub fn start(&self) -> Option<u64> {
        self.start
    }

    pub fn latest(&self) -> Option<u64> {
        self.latest
    }

    pub fn elapsed(&self) -> Option<u64> {
        self.state().elapsed()
    }

    /// Forgets the clock so the next tick opens a new window.
    ///
    /// Metrics are kept.
    pub fn reset(&mut self) {
        self.start = None;
        self.latest = None;
        self.counted_close = false;
    }

    pub fn window_ms(&self) -> u64 {
        self.config.window_ms
    }

    pub fn metrics(&self) -> &WindowMetrics {
        &self.metrics
    }
}
