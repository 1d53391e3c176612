//! Offline rendering: demo gesture → control plane → engine, on a simulated
//! clock, written to a WAV file and a waterfall image.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::control::{
    event_channel, ControlPlane, DisplacementEvent, EventSender, Verdict, WatchdogState,
};
use crate::error::RecordError;
use crate::params::{audio_constants::BLOCK_SIZE, ConfigHandle, RecordingConfig};
use crate::shared::SharedState;
use crate::source::DemoGesture;
use crate::synth::{ParameterTarget, SynthEngine};
use crate::visual::Visualizer;

/// What an offline render produced
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub frames: usize,
    pub events: usize,
    pub peak: f32,
    /// Times the watchdog silenced a stalled gesture
    pub silences: usize,
    pub final_state: WatchdogState,
}

/// Offline pipeline running every domain on one thread
pub struct OfflineSession {
    gesture: DemoGesture,
    control: ControlPlane,
    sender: EventSender,
    engine: SynthEngine,
    visualizer: Visualizer,
    sample_rate_hz: u32,
    refresh_frames: usize,
    clock: Instant,
}

impl OfflineSession {
    pub fn new(config: ConfigHandle, gesture: DemoGesture, sample_rate_hz: u32) -> Self {
        let cfg = config.load();
        let shared = SharedState::new(ParameterTarget::silent(cfg.synth.base_frequency_hz));
        let (sender, events) = event_channel();
        let refresh_frames = ((cfg.spectrum.refresh_interval().as_secs_f64()
            * sample_rate_hz as f64) as usize)
            .max(1);

        Self {
            gesture,
            control: ControlPlane::new(config.clone(), Arc::clone(&shared), events),
            sender,
            engine: SynthEngine::new(sample_rate_hz, config.clone(), Arc::clone(&shared)),
            visualizer: Visualizer::new(sample_rate_hz, config, shared),
            sample_rate_hz,
            refresh_frames,
            clock: Instant::now(),
        }
    }

    pub fn visualizer(&self) -> &Visualizer {
        &self.visualizer
    }

    /// Render `total_frames` frames, handing each interleaved stereo block to
    /// `sink`
    pub fn run<F>(&mut self, total_frames: usize, mut sink: F) -> Result<RenderSummary, RecordError>
    where
        F: FnMut(&[f32]) -> Result<(), RecordError>,
    {
        let rate = self.sample_rate_hz as f64;
        let mut summary = RenderSummary {
            frames: 0,
            events: 0,
            peak: 0.0,
            silences: 0,
            final_state: self.control.watchdog_state(),
        };
        let mut next_refresh = 0;

        while summary.frames < total_frames {
            let frames = BLOCK_SIZE.min(total_frames - summary.frames);
            let t0 = summary.frames as f64 / rate;
            let t1 = (summary.frames + frames) as f64 / rate;

            for (t, dx, dy) in self.gesture.reports_between(t0 as f32, t1 as f32) {
                self.sender.send(DisplacementEvent {
                    dx,
                    dy,
                    timestamp: self.clock + Duration::from_secs_f32(t),
                });
            }
            let report = self.control.poll(self.clock + Duration::from_secs_f64(t1));
            summary.events += report.events;
            if report.verdict == Verdict::Silence {
                summary.silences += 1;
            }

            let block = self.engine.render(frames);
            summary.peak = block.iter().fold(summary.peak, |peak, s| peak.max(s.abs()));
            sink(block)?;

            summary.frames += frames;
            if summary.frames >= next_refresh {
                self.visualizer.snapshot();
                next_refresh += self.refresh_frames;
            }
        }

        summary.final_state = self.control.watchdog_state();
        Ok(summary)
    }
}

/// Render the demo gesture to `audio.wav` and `waterfall.png` under the
/// recording's output directory
pub fn render_offline(
    config: ConfigHandle,
    recording: &RecordingConfig,
) -> Result<RenderSummary, RecordError> {
    config.load().validate()?;
    std::fs::create_dir_all(&recording.output_dir)?;

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: recording.sample_rate_hz,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(recording.audio_path(), spec)?;

    let mut session = OfflineSession::new(config, DemoGesture::default(), recording.sample_rate_hz);
    let summary = session.run(recording.total_frames(), |block| {
        for &sample in block {
            writer.write_sample(sample)?;
        }
        Ok(())
    })?;
    writer.finalize()?;

    session
        .visualizer()
        .waterfall()
        .to_image()
        .save(recording.waterfall_path())?;

    info!(
        "Rendered {:.1}s ({} events, peak {:.3}) to {}",
        summary.frames as f32 / recording.sample_rate_hz as f32,
        summary.events,
        summary.peak,
        recording.output_dir
    );
    Ok(summary)
}
