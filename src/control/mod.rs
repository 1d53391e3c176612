//! Control plane: drains displacement events, maps them to targets, and runs
//! the silence watchdog.
//!
//! Producers push events through a bounded channel and never wait; the
//! control plane publishes each new target as a whole vector.

mod watchdog;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use tracing::{debug, trace, warn};

use crate::params::ConfigHandle;
use crate::shared::SharedState;
use crate::synth::{map_displacement, ParameterTarget};

pub use watchdog::{SilenceWatchdog, Verdict, WatchdogState};

/// Pending events held before producers start dropping
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Longest the control thread sleeps without an event
pub const CONTROL_TICK: Duration = Duration::from_millis(5);

/// One pointer displacement report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplacementEvent {
    pub dx: i16,
    pub dy: i16,
    pub timestamp: Instant,
}

impl DisplacementEvent {
    pub fn now(dx: i16, dy: i16) -> Self {
        Self {
            dx,
            dy,
            timestamp: Instant::now(),
        }
    }
}

/// Producer side of the event channel
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<DisplacementEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventSender {
    /// Queue an event without blocking.
    ///
    /// Returns false when the queue is full (event dropped) or the control
    /// plane is gone.
    pub fn send(&self, event: DisplacementEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Events dropped because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a connected producer/consumer pair
pub fn event_channel() -> (EventSender, Receiver<DisplacementEvent>) {
    let (tx, rx) = crossbeam_channel::bounded(EVENT_QUEUE_CAPACITY);
    let sender = EventSender {
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (sender, rx)
}

/// Result of one control tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub events: usize,
    pub verdict: Verdict,
    pub state: WatchdogState,
}

/// Control-plane state machine
pub struct ControlPlane {
    config: ConfigHandle,
    shared: Arc<SharedState>,
    events: Receiver<DisplacementEvent>,
    watchdog: SilenceWatchdog,
    current: ParameterTarget,
    producer_lost: bool,
}

impl ControlPlane {
    pub fn new(
        config: ConfigHandle,
        shared: Arc<SharedState>,
        events: Receiver<DisplacementEvent>,
    ) -> Self {
        let current = shared.load_target();
        Self {
            config,
            shared,
            events,
            watchdog: SilenceWatchdog::new(),
            current,
            producer_lost: false,
        }
    }

    pub fn watchdog_state(&self) -> WatchdogState {
        self.watchdog.state()
    }

    /// Latest target published by this control plane
    pub fn current_target(&self) -> ParameterTarget {
        self.current
    }

    /// True once every producer has hung up
    pub fn producer_lost(&self) -> bool {
        self.producer_lost
    }

    /// Map one event and publish the resulting target
    pub fn apply_event(&mut self, event: DisplacementEvent) {
        let cfg = self.config.load();
        self.current = map_displacement(event.dx as f32, event.dy as f32, &cfg.synth);
        self.shared.store_target(self.current);
        self.watchdog.note_event(event.timestamp);
        trace!(dx = event.dx, dy = event.dy, timestamp = ?event.timestamp, "displacement");
    }

    /// Drain every pending event, then evaluate the watchdog at `now`
    pub fn poll(&mut self, now: Instant) -> TickReport {
        let mut events = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.apply_event(event);
                    events += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.note_producer_lost();
                    break;
                }
            }
        }
        self.check_watchdog(now, events)
    }

    fn check_watchdog(&mut self, now: Instant, events: usize) -> TickReport {
        let timeout = self.config.load().synth.decay_timeout();
        let before = self.watchdog.state();
        let verdict = self
            .watchdog
            .evaluate(now, timeout, self.shared.smoothed_volume());

        if verdict == Verdict::Silence {
            self.current = self.current.silenced();
            self.shared.store_target(self.current);
        }
        let state = self.watchdog.state();
        if state != before {
            debug!(?before, ?state, "watchdog transition");
        }

        TickReport {
            events,
            verdict,
            state,
        }
    }

    fn note_producer_lost(&mut self) {
        if !self.producer_lost {
            warn!("Event producer disconnected; decaying to silence");
            self.producer_lost = true;
        }
    }

    /// Run until the shared running flag clears, waking on events or every
    /// [`CONTROL_TICK`]
    pub fn run(mut self) {
        while self.shared.is_running() {
            if self.producer_lost {
                thread::sleep(CONTROL_TICK);
                self.check_watchdog(Instant::now(), 0);
                continue;
            }
            match self.events.recv_timeout(CONTROL_TICK) {
                Ok(event) => {
                    self.apply_event(event);
                    self.poll(Instant::now());
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.check_watchdog(Instant::now(), 0);
                }
                Err(RecvTimeoutError::Disconnected) => self.note_producer_lost(),
            }
        }
        debug!("Control plane stopped");
    }

    /// Run on a dedicated thread
    pub fn spawn(self) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("control".to_string())
            .spawn(move || self.run())
    }
}
