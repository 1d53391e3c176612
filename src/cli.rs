//! Command-line argument parsing.

use clap::{Parser, ValueEnum};

use crate::params::{EngineConfig, RecordingConfig, SmoothingPolicy};

/// Where displacement events come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Scripted pointer gesture
    Demo,
    /// One `dx dy` pair per line on standard input
    Stdin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Per-sample linear ramp (no stepping)
    Ramp,
    /// Block-rate exponential average (stepped)
    Block,
}

impl From<PolicyArg> for SmoothingPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Ramp => SmoothingPolicy::SampleRamp,
            PolicyArg::Block => SmoothingPolicy::BlockEma,
        }
    }
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "glidesynth")]
#[command(about = "Pointer-motion synthesizer with spectral waterfall", long_about = None)]
pub struct Args {
    /// Event source
    #[arg(long, value_enum, default_value = "demo")]
    pub source: SourceKind,

    /// Stop after this many seconds (default: demo runs 10s, stdin until EOF)
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f32>,

    /// Render the demo gesture offline instead of playing it (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Output directory for offline rendering
    #[arg(long, value_name = "DIR", default_value = "recording")]
    pub output_dir: String,

    /// Save the live waterfall as PNG on exit
    #[arg(long, value_name = "PATH")]
    pub waterfall: Option<String>,

    /// Master gain (0..1)
    #[arg(long, default_value = "0.5")]
    pub gain: f32,

    /// Pitch at rest (Hz)
    #[arg(long, value_name = "HZ", default_value = "110")]
    pub base_freq: f32,

    /// Pitch added per unit of speed
    #[arg(long, default_value = "15")]
    pub pitch_scale: f32,

    /// Smoothing, 0.01 (responsive) to 0.95 (heavy)
    #[arg(long, default_value = "0.3")]
    pub smoothing: f32,

    /// Silence after this long without events
    #[arg(long, value_name = "MS", default_value = "50")]
    pub decay_timeout_ms: u64,

    /// Frequency ratio of the harmonic voice
    #[arg(long, default_value = "2.5")]
    pub harmonic_ratio: f32,

    /// Smoothing policy
    #[arg(long, value_enum, default_value = "ramp")]
    pub policy: PolicyArg,

    /// Waterfall contrast
    #[arg(long, default_value = "1.0")]
    pub contrast: f32,

    /// Waterfall rows per tick
    #[arg(long, default_value = "2")]
    pub scroll_speed: usize,

    /// Highest frequency shown in the waterfall
    #[arg(long, value_name = "HZ", default_value = "4000")]
    pub max_freq_view: f32,
}

impl Args {
    /// Engine configuration from the command line (not yet validated)
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();

        let synth = &mut config.synth;
        synth.gain = self.gain;
        synth.base_frequency_hz = self.base_freq;
        synth.pitch_scale = self.pitch_scale;
        synth.smoothing = self.smoothing;
        synth.decay_timeout_ms = self.decay_timeout_ms;
        synth.harmonic_ratio = self.harmonic_ratio;
        synth.policy = self.policy.into();

        let spectrum = &mut config.spectrum;
        spectrum.contrast = self.contrast;
        spectrum.scroll_speed = self.scroll_speed;
        spectrum.max_freq_view_hz = self.max_freq_view;

        config
    }

    /// Create recording configuration if offline mode is enabled
    pub fn recording_config(&self) -> Option<RecordingConfig> {
        self.record.map(|duration| {
            let mut config = RecordingConfig::new(duration);
            config.output_dir = self.output_dir.clone();
            config
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let args = Args::parse_from(["glidesynth"]);
        let config = args.engine_config();
        let defaults = EngineConfig::default();

        assert_eq!(config.synth.gain, defaults.synth.gain);
        assert_eq!(config.synth.base_frequency_hz, defaults.synth.base_frequency_hz);
        assert_eq!(config.synth.policy, defaults.synth.policy);
        assert_eq!(config.spectrum.scroll_speed, defaults.spectrum.scroll_speed);
        assert!(config.validate().is_ok());
        assert!(args.recording_config().is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "glidesynth",
            "--source",
            "stdin",
            "--policy",
            "block",
            "--gain",
            "0.8",
            "--record",
            "3",
            "--output-dir",
            "out",
        ]);
        assert_eq!(args.source, SourceKind::Stdin);

        let config = args.engine_config();
        assert_eq!(config.synth.policy, SmoothingPolicy::BlockEma);
        assert_eq!(config.synth.gain, 0.8);

        let recording = args.recording_config().unwrap();
        assert_eq!(recording.duration_secs, 3.0);
        assert_eq!(recording.output_dir, "out");
    }
}
