//! Parameter definitions with physical units and documented semantics.
//!
//! All tunable numbers live here with:
//! - Physical units (Hz, milliseconds, counts)
//! - Documented ranges and meanings
//! - Validation before they reach the render path

mod audio;
mod recording;
mod spectrum;
mod synth;

use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};

use crate::error::ConfigError;

// Re-export all types
pub use audio::audio_constants;
pub use recording::RecordingConfig;
pub use spectrum::{SpectrumConfig, WindowFunction};
pub use synth::{SmoothingPolicy, SynthConfig};

/// Complete engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub synth: SynthConfig,
    pub spectrum: SpectrumConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.synth.validate()?;
        self.spectrum.validate()
    }
}

/// Runtime-adjustable configuration shared by every timing domain.
///
/// Reads are lock-free and see one consistent config; updates replace the
/// whole struct atomically.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<ArcSwap<EngineConfig>>,
}

impl ConfigHandle {
    /// Wrap a validated configuration
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        })
    }

    /// Current configuration (cheap, never blocks)
    pub fn load(&self) -> Guard<Arc<EngineConfig>> {
        self.inner.load()
    }

    /// Owned snapshot of the current configuration
    pub fn snapshot(&self) -> EngineConfig {
        EngineConfig::clone(&self.inner.load())
    }

    /// Apply a change to a copy of the current config and publish it.
    ///
    /// An invalid result is rejected and the previous config stays live.
    pub fn update<F>(&self, change: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut EngineConfig),
    {
        let mut next = self.snapshot();
        change(&mut next);
        next.validate()?;
        self.inner.store(Arc::new(next));
        Ok(())
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(EngineConfig::default())),
        }
    }
}

pub(crate) fn check_range(
    name: &'static str,
    value: f32,
    min: f32,
    max: f32,
) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value: value as f64,
            min: min as f64,
            max: max as f64,
        })
    }
}

pub(crate) fn check_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive {
            name,
            value: value as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_update() {
        let handle = ConfigHandle::default();
        handle.update(|cfg| cfg.synth.gain = 0.8).unwrap();
        assert_eq!(handle.load().synth.gain, 0.8);
    }

    #[test]
    fn test_handle_rejects_invalid_update() {
        let handle = ConfigHandle::default();
        let result = handle.update(|cfg| cfg.synth.gain = 2.0);
        assert!(result.is_err());

        // Previous config stays live
        assert_eq!(handle.load().synth.gain, 0.5);
    }

    #[test]
    fn test_handle_clones_share_state() {
        let handle = ConfigHandle::default();
        let other = handle.clone();
        other.update(|cfg| cfg.spectrum.contrast = 3.0).unwrap();
        assert_eq!(handle.load().spectrum.contrast, 3.0);
    }

    #[test]
    fn test_new_validates() {
        let mut config = EngineConfig::default();
        config.spectrum.height = 0;
        assert!(ConfigHandle::new(config).is_err());
    }
}
