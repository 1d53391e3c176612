//! Block renderer: smoothing → oscillator bank → mixer.
//!
//! The engine owns the smoothed state and every phase accumulator; the host
//! audio subsystem pulls samples from it on its own deadline. Nothing in the
//! render path blocks or allocates once the engine is built.

use std::sync::Arc;

use super::mixer::{apply_volume, write_interleaved};
use super::oscillator::OscillatorBank;
use super::smoothing::{ParameterState, Smoother, Trajectory};
use crate::params::{audio_constants::BLOCK_SIZE, ConfigHandle};
use crate::shared::SharedState;

/// Index of the detuned harmonic in the default bank
const HARMONIC_VOICE: usize = 1;

/// Real-time synthesis engine
pub struct SynthEngine {
    sample_rate_hz: f32,
    config: ConfigHandle,
    shared: Arc<SharedState>,
    smoother: Smoother,
    bank: OscillatorBank,
    trajectory: Trajectory,
    mono: Vec<f32>,
    last_frames: usize,
    /// Ring of the most recent `BLOCK_SIZE` mono samples, across blocks
    history: Vec<f32>,
    history_cursor: usize,
    /// `history` unrolled oldest first, for publishing
    window: Vec<f32>,
    /// Interleaved stereo scratch for [`SynthEngine::render`]
    output: Vec<f32>,
}

impl SynthEngine {
    /// Create an engine resting at the current target
    pub fn new(sample_rate_hz: u32, config: ConfigHandle, shared: Arc<SharedState>) -> Self {
        let (policy, harmonic_ratio) = {
            let cfg = config.load();
            (cfg.synth.policy, cfg.synth.harmonic_ratio)
        };
        let initial = ParameterState::at(&shared.load_target());

        Self {
            sample_rate_hz: sample_rate_hz as f32,
            config,
            shared,
            smoother: Smoother::new(initial, policy),
            bank: OscillatorBank::fundamental_with_harmonic(harmonic_ratio),
            trajectory: Trajectory::with_capacity(BLOCK_SIZE),
            mono: vec![0.0; BLOCK_SIZE],
            last_frames: 0,
            history: vec![0.0; BLOCK_SIZE],
            history_cursor: 0,
            window: vec![0.0; BLOCK_SIZE],
            output: Vec::with_capacity(BLOCK_SIZE * 2),
        }
    }

    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate_hz
    }

    /// Smoothed state reached at the end of the last block
    pub fn state(&self) -> ParameterState {
        self.smoother.state()
    }

    pub fn bank(&self) -> &OscillatorBank {
        &self.bank
    }

    /// Mono samples of the most recent block
    pub fn last_block(&self) -> &[f32] {
        &self.mono[..self.last_frames]
    }

    /// Render `frame_count` frames of interleaved stereo.
    ///
    /// The returned slice is valid until the next call. Reuses its buffer;
    /// only a request larger than any before grows it.
    pub fn render(&mut self, frame_count: usize) -> &[f32] {
        let mut output = std::mem::take(&mut self.output);
        output.resize(frame_count * 2, 0.0);
        self.render_into(&mut output, 2);
        self.output = output;
        &self.output
    }

    /// Fill an interleaved device buffer of `channels` channels.
    ///
    /// Long buffers are rendered as consecutive blocks of at most
    /// [`BLOCK_SIZE`] frames; the smoothed state advances once per block.
    /// Afterwards the last [`BLOCK_SIZE`] mono samples are published as one
    /// frame, whatever the buffer length.
    pub fn render_into(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        for chunk in out.chunks_mut(BLOCK_SIZE * channels) {
            let frames = chunk.len() / channels;
            if frames == 0 {
                chunk.fill(0.0);
                continue;
            }
            self.render_block(frames);
            write_interleaved(&self.mono[..frames], &self.trajectory.pan[..frames], channels, chunk);
        }
        self.publish_window();
    }

    fn render_block(&mut self, frames: usize) {
        let cfg = self.config.load();
        let synth = &cfg.synth;
        let target = self.shared.load_target();

        self.smoother.set_policy(synth.policy);
        if let Some(harmonic) = self.bank.voice_mut(HARMONIC_VOICE) {
            harmonic.ratio = synth.harmonic_ratio;
        }

        self.smoother.advance(
            &target,
            synth.smoothing_alpha(),
            synth.gain,
            frames,
            &mut self.trajectory,
        );

        let mono = &mut self.mono[..frames];
        self.bank.render(
            &self.trajectory.frequency[..frames],
            &self.trajectory.timbre[..frames],
            self.sample_rate_hz,
            mono,
        );
        apply_volume(mono, &self.trajectory.volume[..frames]);

        for &sample in mono.iter() {
            self.history[self.history_cursor] = sample;
            self.history_cursor = (self.history_cursor + 1) % BLOCK_SIZE;
        }

        self.last_frames = frames;
        self.shared.set_smoothed_volume(self.smoother.state().volume);
    }

    fn publish_window(&mut self) {
        let (newer, older) = self.history.split_at(self.history_cursor);
        let split = older.len();
        self.window[..split].copy_from_slice(older);
        self.window[split..].copy_from_slice(newer);
        self.shared.publish_frame(&self.window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{audio_constants::DEFAULT_SAMPLE_RATE_HZ, SmoothingPolicy};
    use crate::synth::{map_displacement, ParameterTarget};

    fn engine_with(config: ConfigHandle) -> (SynthEngine, Arc<SharedState>) {
        let base = config.load().synth.base_frequency_hz;
        let shared = SharedState::new(ParameterTarget::silent(base));
        let engine = SynthEngine::new(DEFAULT_SAMPLE_RATE_HZ, config, Arc::clone(&shared));
        (engine, shared)
    }

    #[test]
    fn test_silence_renders_zeros() {
        let (mut engine, _) = engine_with(ConfigHandle::default());
        let out = engine.render(BLOCK_SIZE);
        assert_eq!(out.len(), BLOCK_SIZE * 2);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_converges_to_target() {
        let config = ConfigHandle::default();
        let (mut engine, shared) = engine_with(config.clone());
        let target = map_displacement(30.0, 0.0, &config.load().synth);
        shared.store_target(target);

        // One second of blocks is far beyond the smoothing time constant
        for _ in 0..(DEFAULT_SAMPLE_RATE_HZ as usize / BLOCK_SIZE) {
            engine.render(BLOCK_SIZE);
        }

        let state = engine.state();
        assert!((state.frequency - target.frequency).abs() < 1e-2);
        assert!((state.volume - target.volume).abs() < 1e-4);
        assert!((state.pan - target.pan).abs() < 1e-4);
        assert!((shared.smoothed_volume() - state.volume).abs() < 1e-6);
    }

    #[test]
    fn test_output_bounded_by_gain() {
        let config = ConfigHandle::default();
        let (mut engine, shared) = engine_with(config.clone());
        shared.store_target(map_displacement(300.0, 300.0, &config.load().synth));

        for _ in 0..100 {
            let gain = config.load().synth.gain;
            let out = engine.render(BLOCK_SIZE);
            // Two unit voices, headroom 0.5, volume ≤ gain
            assert!(out.iter().all(|s| s.abs() <= gain + 1e-5));
        }
    }

    #[test]
    fn test_publishes_latest_block() {
        let config = ConfigHandle::default();
        let (mut engine, shared) = engine_with(config.clone());
        shared.store_target(map_displacement(20.0, 5.0, &config.load().synth));
        engine.render(BLOCK_SIZE);
        engine.render(BLOCK_SIZE);

        let mut frame = Vec::new();
        assert_eq!(shared.copy_frame(&mut frame), 2);
        assert_eq!(frame.as_slice(), engine.last_block());
    }

    #[test]
    fn test_long_buffer_rendered_in_blocks() {
        let config = ConfigHandle::default();
        let (mut engine, shared) = engine_with(config.clone());
        shared.store_target(map_displacement(20.0, 0.0, &config.load().synth));

        let mut device = vec![0.0; BLOCK_SIZE * 3 * 2 + 20];
        engine.render_into(&mut device, 2);

        // Three full blocks plus a 10-frame remainder, published once as a
        // full window ending on the remainder
        assert_eq!(engine.last_block().len(), 10);
        let mut frame = Vec::new();
        assert_eq!(shared.copy_frame(&mut frame), 1);
        assert_eq!(frame.len(), BLOCK_SIZE);
        assert_eq!(&frame[BLOCK_SIZE - 10..], engine.last_block());
    }

    #[test]
    fn test_odd_device_buffer_keeps_full_spectrum_window() {
        let config = ConfigHandle::default();
        let (mut engine, shared) = engine_with(config.clone());
        shared.store_target(map_displacement(30.0, 0.0, &config.load().synth));

        // 260-frame callbacks leave a 4-frame remainder each time
        let mut device = vec![0.0; 260 * 2];
        for _ in 0..40 {
            engine.render_into(&mut device, 2);
        }

        let mut frame = Vec::new();
        shared.copy_frame(&mut frame);
        assert_eq!(frame.len(), BLOCK_SIZE);

        // Window holds the tail of the device buffer (left = mono · left gain)
        let (left_gain, _) = crate::synth::pan_gains(engine.state().pan);
        let left = device[2 * (260 - BLOCK_SIZE)..].iter().step_by(2);
        for (&sample, &out) in frame.iter().zip(left) {
            assert!((sample * left_gain - out).abs() < 1e-5);
        }

        let mut visualizer =
            crate::visual::Visualizer::new(DEFAULT_SAMPLE_RATE_HZ, config, Arc::clone(&shared));
        let row = visualizer.snapshot().row;
        assert!(row.iter().any(|&v| v > 0.5));
    }

    #[test]
    fn test_partial_trailing_frame_is_zeroed() {
        let (mut engine, _) = engine_with(ConfigHandle::default());
        let mut device = vec![9.0; 2 * 4 + 1];
        engine.render_into(&mut device, 2);
        assert_eq!(device[8], 0.0);
    }

    #[test]
    fn test_ramp_has_no_block_boundary_jumps() {
        let config = ConfigHandle::default();
        config
            .update(|cfg| cfg.synth.policy = SmoothingPolicy::SampleRamp)
            .unwrap();
        let (mut engine, shared) = engine_with(config.clone());
        shared.store_target(map_displacement(40.0, 0.0, &config.load().synth));

        let mut previous_last = None;
        for _ in 0..20 {
            let out = engine.render(BLOCK_SIZE).to_vec();
            let left: Vec<f32> = out.iter().step_by(2).copied().collect();
            if let Some(last) = previous_last {
                let jump: f32 = left[0] - last;
                // Bounded by the highest frequency's slope at full gain
                let max_slope = std::f32::consts::TAU * 3.5 * 710.0 / 44100.0;
                assert!(jump.abs() <= max_slope);
            }
            previous_last = Some(left[BLOCK_SIZE - 1]);
        }
    }

    #[test]
    fn test_runtime_harmonic_ratio_change() {
        let config = ConfigHandle::default();
        let (mut engine, _) = engine_with(config.clone());
        config.update(|cfg| cfg.synth.harmonic_ratio = 2.25).unwrap();
        engine.render(16);
        assert_eq!(engine.bank().voices()[HARMONIC_VOICE].ratio, 2.25);
    }
}
