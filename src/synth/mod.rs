//! Real-time synthesis: displacement mapping, smoothing, oscillators, mixing.
//!
//! Control flow per block: latest [`ParameterTarget`] → [`Smoother`] →
//! [`OscillatorBank`] → volume envelope and constant-power pan.

mod engine;
mod mapper;
mod mixer;
mod oscillator;
mod smoothing;

// Re-export public types
pub use engine::SynthEngine;
pub use mapper::{map_displacement, ParameterTarget};
pub use mixer::{apply_volume, pan_gains, write_interleaved};
pub use oscillator::{phase_increment, OscillatorBank, PhaseAccumulator, Voice, VoiceWeight};
pub use smoothing::{ParameterState, Smoother, Trajectory};
