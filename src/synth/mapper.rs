//! Displacement → target parameter mapping.

use crate::params::SynthConfig;

/// Target parameter vector written by the control plane.
///
/// Always replaced as a whole; the render path only reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterTarget {
    /// Fundamental frequency (Hz)
    pub frequency: f32,

    /// Loudness (0..gain)
    pub volume: f32,

    /// Stereo position (-1 left .. 1 right)
    pub pan: f32,

    /// Harmonic brightness (0..1)
    pub timbre: f32,
}

impl ParameterTarget {
    /// Silent target resting at the base pitch
    pub fn silent(base_frequency_hz: f32) -> Self {
        Self {
            frequency: base_frequency_hz,
            volume: 0.0,
            pan: 0.0,
            timbre: 0.0,
        }
    }

    /// Same target with the volume forced to zero
    pub fn silenced(self) -> Self {
        Self {
            volume: 0.0,
            ..self
        }
    }
}

/// Map one pointer displacement to a target parameter vector.
///
/// Zero displacement is a valid silence target; the smoothing stage
/// absorbs the step.
pub fn map_displacement(dx: f32, dy: f32, config: &SynthConfig) -> ParameterTarget {
    let speed = (dx * dx + dy * dy).sqrt();

    // Logarithmic loudness curve, capped at the gain ceiling
    let volume = if speed > 0.0 {
        ((speed + 1.0).ln() / 4.0 * config.gain).min(config.gain)
    } else {
        0.0
    };

    ParameterTarget {
        frequency: config.base_frequency_hz + speed * config.pitch_scale,
        volume,
        pan: (dx / config.pan_divisor).clamp(-1.0, 1.0),
        timbre: (dy.abs() / config.timbre_divisor).clamp(0.0, 1.0),
    }
}
