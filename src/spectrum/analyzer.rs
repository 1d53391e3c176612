//! Magnitude spectrum → normalized, resampled display row.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::params::{SpectrumConfig, WindowFunction};

/// Added to the peak before normalizing so silent blocks divide safely
pub const NORMALIZE_EPSILON: f32 = 0.001;

/// Spectral analyzer with a cached FFT plan and scratch buffers
pub struct SpectralAnalyzer {
    planner: FftPlanner<f32>,
    /// Planned transform and the block length it was planned for
    fft: Option<(usize, Arc<dyn Fft<f32>>)>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            fft: None,
            buffer: Vec::new(),
            scratch: Vec::new(),
            magnitudes: Vec::new(),
        }
    }

    /// Compute one display row of `config.width` values from a mono block.
    ///
    /// Silent or empty input yields an all-zero row.
    pub fn row(&mut self, block: &[f32], sample_rate_hz: f32, config: &SpectrumConfig) -> Vec<f32> {
        let mut row = vec![0.0; config.width];
        self.row_into(block, sample_rate_hz, config, &mut row);
        row
    }

    /// Same as [`SpectralAnalyzer::row`], writing into `row`
    pub fn row_into(
        &mut self,
        block: &[f32],
        sample_rate_hz: f32,
        config: &SpectrumConfig,
        row: &mut [f32],
    ) {
        row.fill(0.0);
        let bins = config.view_bins(block.len(), sample_rate_hz);
        if bins == 0 {
            return;
        }

        self.magnitude_spectrum(block, config.window);
        let slice = &mut self.magnitudes[..bins];

        let peak = slice.iter().fold(0.0f32, |max, &m| max.max(m));
        let scale = config.contrast / (peak + NORMALIZE_EPSILON);
        for m in slice.iter_mut() {
            *m *= scale;
        }

        resample_linear(slice, row);
    }

    /// Fill `self.magnitudes` with `|X[k]|` for `k` in `0..=n/2`
    fn magnitude_spectrum(&mut self, block: &[f32], window: WindowFunction) {
        let n = block.len();
        let fft = match &self.fft {
            Some((len, fft)) if *len == n => Arc::clone(fft),
            _ => {
                let fft = self.planner.plan_fft_forward(n);
                self.scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
                self.fft = Some((n, Arc::clone(&fft)));
                fft
            }
        };

        self.buffer.clear();
        self.buffer.extend(block.iter().enumerate().map(|(i, &s)| {
            let w = match window {
                WindowFunction::Rectangular => 1.0,
                WindowFunction::Hann => hann_window(i, n),
            };
            Complex::new(s * w, 0.0)
        }));

        fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        self.magnitudes.clear();
        self.magnitudes
            .extend(self.buffer[..n / 2 + 1].iter().map(|c| c.norm()));
    }
}

/// Resample `input` onto `output.len()` evenly spaced points spanning
/// `[0, input.len()]`, interpolating linearly and holding the last value
/// past the end.
pub fn resample_linear(input: &[f32], output: &mut [f32]) {
    if input.is_empty() {
        output.fill(0.0);
        return;
    }
    let last = input.len() - 1;
    let span = input.len() as f32;
    let steps = output.len().saturating_sub(1).max(1) as f32;

    for (j, value) in output.iter_mut().enumerate() {
        let x = j as f32 * span / steps;
        let i = x.floor() as usize;
        *value = if i >= last {
            input[last]
        } else {
            let frac = x - i as f32;
            input[i] + (input[i + 1] - input[i]) * frac
        };
    }
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    if size < 2 {
        return 1.0;
    }
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}
