//! Glidesynth library - pointer motion to click-free audio and a spectral waterfall

pub mod audio;
pub mod cli;
pub mod control;
pub mod error;
pub mod params;
pub mod record;
pub mod shared;
pub mod source;
pub mod spectrum;
pub mod synth;
pub mod visual;
