//! Smoothing stage: turns stepwise targets into continuous trajectories.
//!
//! The smoothed state advances once per block by an exponential moving
//! average toward the latest target. Under [`SmoothingPolicy::SampleRamp`]
//! the samples of the block ramp linearly from the previous state to the new
//! one, ending exactly on it; under [`SmoothingPolicy::BlockEma`] they hold the new state.

use super::mapper::ParameterTarget;
use crate::params::{audio_constants::SNAP_EPSILON, SmoothingPolicy};

/// Smoothed parameter state, owned exclusively by the render path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterState {
    pub frequency: f32,
    pub volume: f32,
    pub pan: f32,
    pub timbre: f32,
}

impl ParameterState {
    /// Start exactly at a target (no initial glide)
    pub fn at(target: &ParameterTarget) -> Self {
        Self {
            frequency: target.frequency,
            volume: target.volume,
            pan: target.pan,
            timbre: target.timbre,
        }
    }

    /// One EMA step toward `target`, with `alpha` in (0, 1].
    ///
    /// Converges monotonically and never overshoots. The volume ceiling is
    /// applied to the result so a lowered gain takes effect.
    pub fn step_toward(&self, target: &ParameterTarget, alpha: f32, gain_ceiling: f32) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        Self {
            frequency: ema(self.frequency, target.frequency, alpha),
            volume: ema(self.volume, target.volume, alpha).clamp(0.0, gain_ceiling.max(0.0)),
            pan: ema(self.pan, target.pan, alpha).clamp(-1.0, 1.0),
            timbre: ema(self.timbre, target.timbre, alpha).clamp(0.0, 1.0),
        }
    }
}

fn ema(state: f32, target: f32, alpha: f32) -> f32 {
    // Rounding must not carry the blend past either endpoint
    let next = (target * alpha + state * (1.0 - alpha)).clamp(state.min(target), state.max(target));
    if (target - next).abs() < SNAP_EPSILON {
        target
    } else {
        next
    }
}

/// Per-sample parameter values for one block.
///
/// Preallocated once; rendering a block never grows it beyond its capacity.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub frequency: Vec<f32>,
    pub volume: Vec<f32>,
    pub pan: Vec<f32>,
    pub timbre: Vec<f32>,
}

impl Trajectory {
    pub fn with_capacity(frames: usize) -> Self {
        Self {
            frequency: vec![0.0; frames],
            volume: vec![0.0; frames],
            pan: vec![0.0; frames],
            timbre: vec![0.0; frames],
        }
    }

    /// Maximum frames per block
    pub fn capacity(&self) -> usize {
        self.frequency.len()
    }

    fn fill(&mut self, frames: usize, from: &ParameterState, to: &ParameterState, policy: SmoothingPolicy) {
        match policy {
            SmoothingPolicy::BlockEma => {
                self.frequency[..frames].fill(to.frequency);
                self.volume[..frames].fill(to.volume);
                self.pan[..frames].fill(to.pan);
                self.timbre[..frames].fill(to.timbre);
            }
            SmoothingPolicy::SampleRamp => {
                ramp(&mut self.frequency[..frames], from.frequency, to.frequency);
                ramp(&mut self.volume[..frames], from.volume, to.volume);
                ramp(&mut self.pan[..frames], from.pan, to.pan);
                ramp(&mut self.timbre[..frames], from.timbre, to.timbre);
            }
        }
    }
}

/// `out[i] = from + i * (to - from) / (len - 1)`, so `out[0] == from` and
/// the last sample lands on `to`.
///
/// `from` is the value the previous block ended on, so consecutive blocks
/// meet without a step. A single-sample block jumps straight to `to`.
fn ramp(out: &mut [f32], from: f32, to: f32) {
    let Some((last, head)) = out.split_last_mut() else {
        return;
    };
    if !head.is_empty() {
        let step = (to - from) / head.len() as f32;
        for (i, value) in head.iter_mut().enumerate() {
            *value = from + step * i as f32;
        }
    }
    *last = to;
}

/// Block-rate smoother with its render-owned state
#[derive(Debug, Clone)]
pub struct Smoother {
    state: ParameterState,
    policy: SmoothingPolicy,
}

impl Smoother {
    pub fn new(initial: ParameterState, policy: SmoothingPolicy) -> Self {
        Self {
            state: initial,
            policy,
        }
    }

    /// Current smoothed state (the value reached at the end of the last block)
    pub fn state(&self) -> ParameterState {
        self.state
    }

    pub fn policy(&self) -> SmoothingPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: SmoothingPolicy) {
        self.policy = policy;
    }

    /// Advance one block of `frames` samples toward `target`, writing the
    /// per-sample values into `trajectory`.
    pub fn advance(
        &mut self,
        target: &ParameterTarget,
        alpha: f32,
        gain_ceiling: f32,
        frames: usize,
        trajectory: &mut Trajectory,
    ) {
        let frames = frames.min(trajectory.capacity());
        if frames == 0 {
            return;
        }
        let next = self.state.step_toward(target, alpha, gain_ceiling);
        trajectory.fill(frames, &self.state, &next, self.policy);
        self.state = next;
    }
}
