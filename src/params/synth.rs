//! Synthesis parameters: displacement mapping, smoothing, and decay.

use std::time::Duration;

use super::{check_positive, check_range};
use crate::error::ConfigError;

/// How the smoothed parameter state turns into per-sample values inside a block.
///
/// Both policies advance the smoothed state once per block with the same
/// exponential moving average; they differ only in what the samples of the
/// block see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingPolicy {
    /// Hold the freshly averaged value for the whole block (audible stepping
    /// at low block rates, cheapest)
    BlockEma,

    /// Ramp linearly from the previous block's value to the freshly averaged
    /// one, so no two adjacent samples differ by more than one ramp step
    #[default]
    SampleRamp,
}

/// Synthesis configuration, all fields adjustable at runtime
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Master gain and volume ceiling (0..1)
    pub gain: f32,

    /// Pitch at zero speed (Hz)
    pub base_frequency_hz: f32,

    /// Pitch added per unit of pointer speed (Hz per count)
    /// Formula: frequency = base_frequency + speed * pitch_scale
    pub pitch_scale: f32,

    /// Smoothing amount: 0.01 (fast, responsive) to 0.95 (slow, heavy)
    /// Formula: alpha = (1 - smoothing) * 0.5
    pub smoothing: f32,

    /// Silence after this long without a displacement event (milliseconds)
    pub decay_timeout_ms: u64,

    /// Horizontal displacement giving a hard pan (counts)
    pub pan_divisor: f32,

    /// Vertical displacement giving full timbre (counts)
    pub timbre_divisor: f32,

    /// Frequency ratio of the detuned harmonic voice to the fundamental
    pub harmonic_ratio: f32,

    /// Per-block or per-sample smoothing
    pub policy: SmoothingPolicy,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            gain: 0.5,
            base_frequency_hz: 110.0,
            pitch_scale: 15.0,
            smoothing: 0.3,
            decay_timeout_ms: 50,
            pan_divisor: 60.0,
            timbre_divisor: 50.0,
            harmonic_ratio: 2.5, // Non-integer so it never shares wrap timing with the fundamental
            policy: SmoothingPolicy::default(),
        }
    }
}

impl SynthConfig {
    /// EMA blend weight for the block-rate smoothing step
    pub fn smoothing_alpha(&self) -> f32 {
        (1.0 - self.smoothing) * 0.5
    }

    pub fn decay_timeout(&self) -> Duration {
        Duration::from_millis(self.decay_timeout_ms)
    }

    /// Validate all ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("gain", self.gain, 0.0, 1.0)?;
        check_range("base_frequency_hz", self.base_frequency_hz, f32::MIN_POSITIVE, 20_000.0)?;
        check_range("pitch_scale", self.pitch_scale, 0.0, 1000.0)?;
        check_range("smoothing", self.smoothing, 0.01, 0.95)?;
        if self.decay_timeout_ms == 0 {
            return Err(ConfigError::NotPositive {
                name: "decay_timeout_ms",
                value: 0.0,
            });
        }
        check_positive("pan_divisor", self.pan_divisor)?;
        check_positive("timbre_divisor", self.timbre_divisor)?;
        check_range("harmonic_ratio", self.harmonic_ratio, f32::MIN_POSITIVE, 16.0)?;
        Ok(())
    }
}
