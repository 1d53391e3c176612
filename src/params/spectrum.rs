//! Spectral export and waterfall display configuration.

use std::time::Duration;

use super::{check_positive, check_range};
use crate::error::ConfigError;

/// Window applied to the block before the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowFunction {
    /// No windowing (raw block)
    #[default]
    Rectangular,
    Hann,
}

/// Spectral export configuration
#[derive(Debug, Clone)]
pub struct SpectrumConfig {
    /// Visual gain applied after normalization
    pub contrast: f32,

    /// Rows inserted into the waterfall per visualization tick (0 freezes it)
    pub scroll_speed: usize,

    /// Highest frequency shown in a row (Hz)
    pub max_freq_view_hz: f32,

    /// Waterfall width (values per row)
    pub width: usize,

    /// Waterfall height (rows kept)
    pub height: usize,

    /// Visualization refresh interval (milliseconds)
    /// 16 = ~60 Hz display cadence
    pub refresh_interval_ms: u64,

    pub window: WindowFunction,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            scroll_speed: 2,
            max_freq_view_hz: 4000.0,
            width: 600,
            height: 256,
            refresh_interval_ms: 16,
            window: WindowFunction::default(),
        }
    }
}

impl SpectrumConfig {
    /// Number of transform bins covering `[0, max_freq_view_hz)` for a block
    /// of `block_len` samples, capped at the real-spectrum length
    pub fn view_bins(&self, block_len: usize, sample_rate_hz: f32) -> usize {
        if block_len == 0 || sample_rate_hz <= 0.0 {
            return 0;
        }
        let bin_width_hz = sample_rate_hz / block_len as f32;
        let bins = (self.max_freq_view_hz / bin_width_hz) as usize;
        bins.min(block_len / 2 + 1)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Validate all ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("contrast", self.contrast, 0.0, 100.0)?;
        check_positive("max_freq_view_hz", self.max_freq_view_hz)?;
        if self.width == 0 {
            return Err(ConfigError::NotPositive {
                name: "width",
                value: 0.0,
            });
        }
        if self.height == 0 {
            return Err(ConfigError::NotPositive {
                name: "height",
                value: 0.0,
            });
        }
        if self.scroll_speed > self.height {
            return Err(ConfigError::OutOfRange {
                name: "scroll_speed",
                value: self.scroll_speed as f64,
                min: 0.0,
                max: self.height as f64,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_bins() {
        let config = SpectrumConfig::default();

        // 44100 / 256 ≈ 172.3 Hz per bin, 4000 Hz ≈ 23 bins
        assert_eq!(config.view_bins(256, 44100.0), 23);

        // Never more than the real spectrum holds
        let mut wide = SpectrumConfig::default();
        wide.max_freq_view_hz = 40_000.0;
        assert_eq!(wide.view_bins(256, 44100.0), 129);

        assert_eq!(config.view_bins(0, 44100.0), 0);
    }

    #[test]
    fn test_validate() {
        assert!(SpectrumConfig::default().validate().is_ok());

        let mut config = SpectrumConfig::default();
        config.scroll_speed = config.height + 1;
        assert!(config.validate().is_err());

        let mut config = SpectrumConfig::default();
        config.width = 0;
        assert!(config.validate().is_err());
    }
}
