//! Displacement event producers.
//!
//! The real pointer capture is an external collaborator; these producers
//! stand in for it. `DemoGesture` plays a scripted, deterministic motion and
//! the stdin reader accepts one `dx dy` pair per line.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};
use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::control::{DisplacementEvent, EventSender};
use crate::shared::SharedState;

/// Pointer report interval (125 Hz, a typical USB mouse)
pub const REPORT_INTERVAL: Duration = Duration::from_millis(8);

/// Shape of one scripted stroke
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeKind {
    /// No reports (lets the silence watchdog fire)
    Rest,

    /// Constant speed in one direction (counts per report)
    Line { speed: f32, angle: f32 },

    /// Constant speed while the direction rotates
    Circle { speed: f32, turns_per_sec: f32 },

    /// Speed rises and falls as a half sine
    Swell { peak_speed: f32, angle: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub duration_secs: f32,
    pub kind: StrokeKind,
}

impl Stroke {
    fn displacement(&self, t: f32) -> (f32, f32) {
        let progress = (t / self.duration_secs).clamp(0.0, 1.0);
        match self.kind {
            StrokeKind::Rest => (0.0, 0.0),
            StrokeKind::Line { speed, angle } => (speed * angle.cos(), speed * angle.sin()),
            StrokeKind::Circle {
                speed,
                turns_per_sec,
            } => {
                let angle = TAU * turns_per_sec * t;
                (speed * angle.cos(), speed * angle.sin())
            }
            StrokeKind::Swell { peak_speed, angle } => {
                let speed = peak_speed * (PI * progress).sin();
                (speed * angle.cos(), speed * angle.sin())
            }
        }
    }
}

/// Looping scripted pointer motion
#[derive(Debug, Clone)]
pub struct DemoGesture {
    strokes: Vec<Stroke>,
    period_secs: f32,
}

impl Default for DemoGesture {
    fn default() -> Self {
        let stroke = |duration_secs, kind| Stroke {
            duration_secs,
            kind,
        };
        Self::new(vec![
            stroke(0.8, StrokeKind::Line { speed: 6.0, angle: 0.0 }),
            stroke(0.4, StrokeKind::Rest),
            stroke(0.6, StrokeKind::Line { speed: 30.0, angle: PI }),
            stroke(0.3, StrokeKind::Rest),
            stroke(1.2, StrokeKind::Circle { speed: 18.0, turns_per_sec: 1.5 }),
            stroke(0.5, StrokeKind::Rest),
            stroke(0.9, StrokeKind::Swell { peak_speed: 50.0, angle: -FRAC_PI_2 }),
            stroke(0.4, StrokeKind::Rest),
            stroke(0.7, StrokeKind::Swell { peak_speed: 35.0, angle: FRAC_PI_4 }),
            stroke(0.6, StrokeKind::Rest),
        ])
    }
}

impl DemoGesture {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        let period_secs = strokes.iter().map(|s| s.duration_secs.max(0.0)).sum();
        Self {
            strokes,
            period_secs,
        }
    }

    pub fn period_secs(&self) -> f32 {
        self.period_secs
    }

    /// Report at `t` seconds into the gesture, or `None` when the pointer
    /// is still
    pub fn displacement_at(&self, t: f32) -> Option<(i16, i16)> {
        if self.period_secs <= 0.0 {
            return None;
        }
        let mut local = t.rem_euclid(self.period_secs);
        for stroke in &self.strokes {
            if local < stroke.duration_secs {
                let (dx, dy) = stroke.displacement(local);
                let (dx, dy) = (to_count(dx), to_count(dy));
                return (dx != 0 || dy != 0).then_some((dx, dy));
            }
            local -= stroke.duration_secs;
        }
        None
    }

    /// Reports falling on the report grid within `[from, to)` seconds, as
    /// `(t, dx, dy)`
    pub fn reports_between(&self, from: f32, to: f32) -> impl Iterator<Item = (f32, i16, i16)> + '_ {
        let interval = REPORT_INTERVAL.as_secs_f32();
        let first = (from / interval).ceil().max(0.0) as u64;
        (first..)
            .map(move |tick| tick as f32 * interval)
            .take_while(move |&t| t < to)
            .filter_map(move |t| self.displacement_at(t).map(|(dx, dy)| (t, dx, dy)))
    }

    /// Play the gesture in real time until the running flag clears
    pub fn spawn(
        self,
        sender: EventSender,
        shared: Arc<SharedState>,
    ) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new().name("demo-source".to_string()).spawn(move || {
            info!("Demo gesture: {:.1}s loop", self.period_secs);
            let start = Instant::now();
            let mut tick: u32 = 0;
            while shared.is_running() {
                let t = (REPORT_INTERVAL * tick).as_secs_f32();
                if let Some((dx, dy)) = self.displacement_at(t) {
                    sender.send(DisplacementEvent::now(dx, dy));
                }
                tick = tick.wrapping_add(1);
                let next = start + REPORT_INTERVAL * tick;
                thread::sleep(next.saturating_duration_since(Instant::now()));
            }
            debug!("Demo source stopped");
        })
    }
}

fn to_count(value: f32) -> i16 {
    value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Parse one `dx dy` line (whitespace or comma separated)
pub fn parse_displacement(line: &str) -> Option<(i16, i16)> {
    let mut parts = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty());
    let dx = parts.next()?.parse().ok()?;
    let dy = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((dx, dy))
}

/// Read displacement lines from `reader` until EOF or shutdown.
///
/// Malformed lines are skipped and `0 0` reports dropped. Returns the number
/// of events sent.
pub fn pump_lines<R: BufRead>(reader: R, sender: &EventSender, shared: &SharedState) -> usize {
    let mut sent = 0;
    for line in reader.lines() {
        if !shared.is_running() {
            break;
        }
        let Ok(line) = line else {
            break;
        };
        match parse_displacement(&line) {
            Some((0, 0)) => {}
            Some((dx, dy)) => {
                if sender.send(DisplacementEvent::now(dx, dy)) {
                    sent += 1;
                }
            }
            None => trace!(line = %line, "skipping malformed line"),
        }
    }
    sent
}

/// Read events from standard input on a dedicated thread
pub fn spawn_stdin_reader(
    sender: EventSender,
    shared: Arc<SharedState>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new().name("stdin-source".to_string()).spawn(move || {
        let stdin = std::io::stdin();
        let sent = pump_lines(stdin.lock(), &sender, &shared);
        info!("Standard input closed after {} events", sent);
        if sender.dropped() > 0 {
            warn!("{} events dropped on a full queue", sender.dropped());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::event_channel;
    use crate::synth::ParameterTarget;

    #[test]
    fn test_parse_displacement() {
        assert_eq!(parse_displacement("12 -7"), Some((12, -7)));
        assert_eq!(parse_displacement("  3,4 "), Some((3, 4)));
        assert_eq!(parse_displacement("3"), None);
        assert_eq!(parse_displacement("3 4 5"), None);
        assert_eq!(parse_displacement("x y"), None);
        assert_eq!(parse_displacement("40000 0"), None);
    }

    #[test]
    fn test_pump_lines_filters() {
        let (tx, rx) = event_channel();
        let shared = SharedState::new(ParameterTarget::silent(110.0));
        let input = "1 2\n0 0\ngarbage\n-5 5\n";

        let sent = pump_lines(input.as_bytes(), &tx, &shared);
        assert_eq!(sent, 2);

        let events: Vec<(i16, i16)> = rx.try_iter().map(|e| (e.dx, e.dy)).collect();
        assert_eq!(events, vec![(1, 2), (-5, 5)]);
    }

    #[test]
    fn test_demo_gesture_rests_and_moves() {
        let gesture = DemoGesture::default();
        assert!(gesture.period_secs() > 5.0);

        // First stroke: slow rightward line
        assert_eq!(gesture.displacement_at(0.1), Some((6, 0)));

        // First rest
        assert_eq!(gesture.displacement_at(1.0), None);

        // Second stroke: fast leftward line
        assert_eq!(gesture.displacement_at(1.3), Some((-30, 0)));

        // Loops
        assert_eq!(
            gesture.displacement_at(0.1 + gesture.period_secs()),
            gesture.displacement_at(0.1)
        );
    }

    #[test]
    fn test_rests_outlast_decay_timeout() {
        let gesture = DemoGesture::default();
        for stroke in &gesture.strokes {
            if stroke.kind == StrokeKind::Rest {
                assert!(stroke.duration_secs > 0.05);
            }
        }
    }

    #[test]
    fn test_reports_on_grid() {
        let gesture = DemoGesture::default();
        let reports: Vec<_> = gesture.reports_between(0.0, 0.1).collect();

        // 0, 8, 16, ... 96 ms
        assert_eq!(reports.len(), 13);
        assert!(reports.iter().all(|&(_, dx, dy)| dx == 6 && dy == 0));

        assert_eq!(gesture.reports_between(0.9, 1.1).count(), 0);
    }
}
