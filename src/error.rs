//! Error types for configuration, audio device setup, and offline recording.

use thiserror::Error;

/// A configuration value outside its documented range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{name} must be > 0, got {value}")]
    NotPositive { name: &'static str, value: f64 },
}

/// Failures opening or driving the output device.
///
/// All of these are fatal at startup; none are retried.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("No audio output device found")]
    NoOutputDevice,

    #[error("Failed to get audio config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Failed to stop audio stream: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),

    #[error("Unsupported sample format: {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Failures writing offline render output.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
}
