//! Volume envelope and constant-power stereo panning.

use std::f32::consts::FRAC_PI_2;

use crate::params::audio_constants::MIX_HEADROOM;

/// Constant-power pan gains `(left, right)` for `pan` in [-1, 1]
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let normalized = (pan.clamp(-1.0, 1.0) + 1.0) / 2.0;
    let angle = normalized * FRAC_PI_2;
    (angle.cos(), angle.sin())
}

/// Scale the voice sum by headroom and the per-sample volume trajectory
pub fn apply_volume(mono: &mut [f32], volume: &[f32]) {
    for (sample, &gain) in mono.iter_mut().zip(volume) {
        *sample *= gain * MIX_HEADROOM;
    }
}

/// Write `mono` into an interleaved buffer of `channels` channels.
///
/// Mono devices get the unpanned signal; stereo and wider get the panned
/// pair on the first two channels and silence on the rest. Samples past the
/// last whole frame written (including a trailing partial frame) are zeroed.
pub fn write_interleaved(mono: &[f32], pan: &[f32], channels: usize, out: &mut [f32]) {
    if channels == 0 {
        return;
    }
    let available = if channels == 1 {
        mono.len()
    } else {
        mono.len().min(pan.len())
    };
    let frames = (out.len() / channels).min(available);
    let (body, tail) = out.split_at_mut(frames * channels);

    if channels == 1 {
        body.copy_from_slice(&mono[..frames]);
    } else {
        for ((frame, &sample), &p) in body.chunks_exact_mut(channels).zip(mono).zip(pan) {
            let (left, right) = pan_gains(p);
            frame[0] = sample * left;
            frame[1] = sample * right;
            frame[2..].fill(0.0);
        }
    }
    tail.fill(0.0);
}
