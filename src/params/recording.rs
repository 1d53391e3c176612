//! Offline recording configuration.

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to render (seconds)
    pub duration_secs: f32,

    /// Output directory for audio and waterfall image
    pub output_dir: String,

    /// Sample rate of the rendered WAV (Hz)
    pub sample_rate_hz: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            sample_rate_hz: super::audio_constants::DEFAULT_SAMPLE_RATE_HZ,
        }
    }

    /// Total number of frames to render
    pub fn total_frames(&self) -> usize {
        (self.duration_secs.max(0.0) * self.sample_rate_hz as f32).ceil() as usize
    }

    /// Audio file path
    pub fn audio_path(&self) -> String {
        format!("{}/audio.wav", self.output_dir)
    }

    /// Waterfall image path
    pub fn waterfall_path(&self) -> String {
        format!("{}/waterfall.png", self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_frames() {
        let config = RecordingConfig::new(0.5);
        assert_eq!(config.total_frames(), 22050);
        assert_eq!(RecordingConfig::new(-1.0).total_frames(), 0);
    }

    #[test]
    fn test_paths() {
        let mut config = RecordingConfig::new(1.0);
        config.output_dir = "out".to_string();
        assert_eq!(config.audio_path(), "out/audio.wav");
        assert_eq!(config.waterfall_path(), "out/waterfall.png");
    }
}
