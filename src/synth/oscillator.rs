//! Phase-continuous sine oscillator bank.
//!
//! Every voice keeps its own phase accumulator across blocks, so frequency
//! changes bend the waveform instead of restarting it.

use std::f64::consts::TAU;

/// Running phase of one voice, always in `[0, 2π)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseAccumulator {
    phase: f64,
}

impl PhaseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> f64 {
        self.phase
    }

    /// Advance by one increment and return the new phase
    #[inline]
    pub fn advance(&mut self, delta: f64) -> f64 {
        self.phase = wrap_phase(self.phase + delta);
        self.phase
    }

    /// Advance by `frames` equal increments in one step
    pub fn advance_constant(&mut self, delta: f64, frames: usize) -> f64 {
        self.phase = wrap_phase(self.phase + delta * frames as f64);
        self.phase
    }
}

/// Wrap into `[0, 2π)`; `rem_euclid` can round up to exactly 2π for tiny
/// negative inputs.
#[inline]
fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Per-sample phase increment for a frequency
#[inline]
pub fn phase_increment(frequency_hz: f32, sample_rate_hz: f32) -> f64 {
    TAU * frequency_hz as f64 / sample_rate_hz as f64
}

/// How strongly a voice contributes to the mix
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceWeight {
    Fixed(f32),

    /// Follow the smoothed timbre trajectory
    Timbre,
}

/// One sine voice at a fixed ratio of the fundamental
#[derive(Debug, Clone)]
pub struct Voice {
    pub ratio: f32,
    pub weight: VoiceWeight,
    phase: PhaseAccumulator,
}

impl Voice {
    pub fn new(ratio: f32, weight: VoiceWeight) -> Self {
        Self {
            ratio,
            weight,
            phase: PhaseAccumulator::new(),
        }
    }

    pub fn phase(&self) -> f64 {
        self.phase.value()
    }

    /// Add this voice's samples into `out`
    fn render_into(&mut self, fundamental: &[f32], timbre: &[f32], sample_rate_hz: f32, out: &mut [f32]) {
        for (i, sample) in out.iter_mut().enumerate() {
            let delta = phase_increment(fundamental[i] * self.ratio, sample_rate_hz);
            let phase = self.phase.advance(delta);
            let weight = match self.weight {
                VoiceWeight::Fixed(w) => w,
                VoiceWeight::Timbre => timbre[i],
            };
            *sample += phase.sin() as f32 * weight;
        }
    }
}

/// Independent voices summed over a shared fundamental trajectory
#[derive(Debug, Clone)]
pub struct OscillatorBank {
    voices: Vec<Voice>,
}

impl OscillatorBank {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self { voices }
    }

    /// Fundamental at full weight plus a detuned harmonic following timbre
    pub fn fundamental_with_harmonic(harmonic_ratio: f32) -> Self {
        Self::new(vec![
            Voice::new(1.0, VoiceWeight::Fixed(1.0)),
            Voice::new(harmonic_ratio, VoiceWeight::Timbre),
        ])
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice_mut(&mut self, index: usize) -> Option<&mut Voice> {
        self.voices.get_mut(index)
    }

    /// Render the summed voices for `out.len()` samples.
    ///
    /// `fundamental` and `timbre` hold per-sample values and must be at
    /// least as long as `out`.
    pub fn render(&mut self, fundamental: &[f32], timbre: &[f32], sample_rate_hz: f32, out: &mut [f32]) {
        let frames = out.len().min(fundamental.len()).min(timbre.len());
        let out = &mut out[..frames];
        out.fill(0.0);
        for voice in &mut self.voices {
            voice.render_into(&fundamental[..frames], &timbre[..frames], sample_rate_hz, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_stays_wrapped() {
        let mut phase = PhaseAccumulator::new();
        for i in 0..100_000 {
            let delta = phase_increment(20.0 + (i % 700) as f32 * 13.7, 44100.0);
            let value = phase.advance(delta);
            assert!((0.0..TAU).contains(&value));
        }

        assert_eq!(wrap_phase(-1e-18), 0.0);
        assert!((0.0..TAU).contains(&wrap_phase(-0.5)));
    }

    #[test]
    fn test_constant_frequency_closed_form_matches_accumulation() {
        let delta = phase_increment(560.0, 44100.0);
        let mut per_sample = PhaseAccumulator::new();
        let mut closed_form = PhaseAccumulator::new();

        for _ in 0..50 {
            for _ in 0..256 {
                per_sample.advance(delta);
            }
            closed_form.advance_constant(delta, 256);
            assert!((per_sample.value() - closed_form.value()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_phase_continuous_across_blocks() {
        let sample_rate = 44100.0;
        let freq = vec![440.0f32; 128];
        let timbre = vec![0.0f32; 128];

        let mut split = OscillatorBank::new(vec![Voice::new(1.0, VoiceWeight::Fixed(1.0))]);
        let mut first = vec![0.0; 64];
        let mut second = vec![0.0; 64];
        split.render(&freq[..64], &timbre[..64], sample_rate, &mut first);
        split.render(&freq[..64], &timbre[..64], sample_rate, &mut second);

        let mut whole = OscillatorBank::new(vec![Voice::new(1.0, VoiceWeight::Fixed(1.0))]);
        let mut joined = vec![0.0; 128];
        whole.render(&freq, &timbre, sample_rate, &mut joined);

        // Two blocks render exactly like one long block
        for (a, b) in first.iter().chain(second.iter()).zip(joined.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_frequency_change_is_click_free() {
        let sample_rate = 44100.0;
        let mut bank = OscillatorBank::new(vec![Voice::new(1.0, VoiceWeight::Fixed(1.0))]);
        let timbre = vec![0.0; 256];
        let mut out = vec![0.0; 256];

        bank.render(&vec![200.0; 256], &timbre, sample_rate, &mut out);
        let last = out[255];
        bank.render(&vec![2000.0; 256], &timbre, sample_rate, &mut out);

        // Adjacent samples never jump more than one increment's worth of slope
        let max_step = phase_increment(2000.0, sample_rate) as f32;
        assert!((out[0] - last).abs() <= max_step + 1e-6);
    }

    #[test]
    fn test_harmonic_voice_has_independent_phase() {
        let mut bank = OscillatorBank::fundamental_with_harmonic(2.5);
        let freq = vec![100.0; 300];
        let timbre = vec![1.0; 300];
        let mut out = vec![0.0; 300];
        bank.render(&freq, &timbre, 44100.0, &mut out);

        let fundamental = bank.voices()[0].phase();
        let harmonic = bank.voices()[1].phase();
        let expected = (phase_increment(250.0, 44100.0) * 300.0).rem_euclid(TAU);
        assert!((harmonic - expected).abs() < 1e-9);
        assert!((fundamental - harmonic).abs() > 1e-3);
    }

    #[test]
    fn test_timbre_weight_silences_harmonic() {
        let freq = vec![100.0; 64];
        let mut with_harmonic = OscillatorBank::fundamental_with_harmonic(2.5);
        let mut fundamental_only = OscillatorBank::new(vec![Voice::new(1.0, VoiceWeight::Fixed(1.0))]);

        let mut a = vec![0.0; 64];
        let mut b = vec![0.0; 64];
        with_harmonic.render(&freq, &vec![0.0; 64], 44100.0, &mut a);
        fundamental_only.render(&freq, &vec![0.0; 64], 44100.0, &mut b);
        assert_eq!(a, b);
    }
}
