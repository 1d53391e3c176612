//! Visualization pull: latest block → spectral row → waterfall.
//!
//! Runs at the display's cadence on its own thread. It only ever copies the
//! latest published block, so it cannot hold up the render path.

use std::sync::Arc;

use crate::params::ConfigHandle;
use crate::shared::SharedState;
use crate::spectrum::{SpectralAnalyzer, Waterfall};

/// One visualization tick
#[derive(Debug, Clone, Default)]
pub struct VisualSnapshot {
    /// Latest mono block (oscilloscope)
    pub mono: Vec<f32>,

    /// Spectral row derived from it
    pub row: Vec<f32>,

    /// Sequence number of the block; unchanged if no new block arrived
    pub sequence: u64,
}

pub struct Visualizer {
    config: ConfigHandle,
    shared: Arc<SharedState>,
    sample_rate_hz: f32,
    analyzer: SpectralAnalyzer,
    waterfall: Waterfall,
    mono: Vec<f32>,
}

impl Visualizer {
    pub fn new(sample_rate_hz: u32, config: ConfigHandle, shared: Arc<SharedState>) -> Self {
        let (width, height) = {
            let cfg = config.load();
            (cfg.spectrum.width, cfg.spectrum.height)
        };
        Self {
            config,
            shared,
            sample_rate_hz: sample_rate_hz as f32,
            analyzer: SpectralAnalyzer::new(),
            waterfall: Waterfall::new(width, height),
            mono: Vec::new(),
        }
    }

    pub fn waterfall(&self) -> &Waterfall {
        &self.waterfall
    }

    /// Take the latest block, derive its row, and scroll it into the waterfall
    pub fn snapshot(&mut self) -> VisualSnapshot {
        let cfg = self.config.load();
        let spectrum = &cfg.spectrum;

        // Display size changed at runtime: start a fresh history
        if self.waterfall.width() != spectrum.width || self.waterfall.height() != spectrum.height {
            self.waterfall = Waterfall::new(spectrum.width, spectrum.height);
        }

        let sequence = self.shared.copy_frame(&mut self.mono);
        let row = self.analyzer.row(&self.mono, self.sample_rate_hz, spectrum);
        self.waterfall.push(&row, spectrum.scroll_speed);

        VisualSnapshot {
            mono: self.mono.clone(),
            row,
            sequence,
        }
    }
}
