//! Silence watchdog: forces the volume target to zero when events stop.
//!
//! ```text
//! Idle ──event──▶ Active ──timeout──▶ Decaying ──volume < ε──▶ Idle
//!                   ▲                    │
//!                   └───────event────────┘
//! ```

use std::time::{Duration, Instant};

use crate::params::audio_constants::IDLE_VOLUME_EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    /// Events arriving within the timeout window
    Active,

    /// Timeout exceeded, target volume forced to zero, smoothing converging
    Decaying,

    /// Smoothed volume has settled at zero
    Idle,
}

/// What the control plane must do after an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Hold,

    /// Force the target volume to zero (issued once per timeout)
    Silence,
}

#[derive(Debug, Clone)]
pub struct SilenceWatchdog {
    state: WatchdogState,
    last_event: Option<Instant>,
}

impl Default for SilenceWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl SilenceWatchdog {
    pub fn new() -> Self {
        Self {
            state: WatchdogState::Idle,
            last_event: None,
        }
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    pub fn last_event(&self) -> Option<Instant> {
        self.last_event
    }

    /// Record an event; any state returns to Active
    pub fn note_event(&mut self, at: Instant) {
        self.last_event = Some(match self.last_event {
            Some(previous) => previous.max(at),
            None => at,
        });
        self.state = WatchdogState::Active;
    }

    /// Check the timeout and the settled volume.
    ///
    /// Returns [`Verdict::Silence`] exactly once per Active→Decaying
    /// transition; further evaluations hold until a new event arrives.
    pub fn evaluate(&mut self, now: Instant, timeout: Duration, smoothed_volume: f32) -> Verdict {
        match self.state {
            WatchdogState::Active => {
                let elapsed = self
                    .last_event
                    .map(|at| now.saturating_duration_since(at))
                    .unwrap_or(Duration::MAX);
                if elapsed > timeout {
                    self.state = WatchdogState::Decaying;
                    Verdict::Silence
                } else {
                    Verdict::Hold
                }
            }
            WatchdogState::Decaying => {
                if smoothed_volume < IDLE_VOLUME_EPSILON {
                    self.state = WatchdogState::Idle;
                }
                Verdict::Hold
            }
            WatchdogState::Idle => Verdict::Hold,
        }
    }
}
