//! State shared between the control, render, and visualization threads.
//!
//! Nothing here can make the render thread wait: the target vector is an
//! atomic pointer swap, and the frame snapshot is published with `try_lock`
//! (a block is skipped when the reader happens to hold the lock).

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::params::audio_constants::BLOCK_SIZE;
use crate::synth::ParameterTarget;

/// Latest rendered mono block plus a sequence number
#[derive(Debug)]
struct FrameBuffer {
    samples: Vec<f32>,
    sequence: u64,
}

/// Shared engine state
#[derive(Debug)]
pub struct SharedState {
    target: ArcSwap<ParameterTarget>,
    frame: Mutex<FrameBuffer>,
    frames_skipped: AtomicU64,
    smoothed_volume: AtomicU32,
    running: AtomicBool,
}

impl SharedState {
    pub fn new(initial: ParameterTarget) -> Arc<Self> {
        Arc::new(Self {
            target: ArcSwap::from_pointee(initial),
            frame: Mutex::new(FrameBuffer {
                samples: Vec::with_capacity(BLOCK_SIZE),
                sequence: 0,
            }),
            frames_skipped: AtomicU64::new(0),
            smoothed_volume: AtomicU32::new(0.0f32.to_bits()),
            running: AtomicBool::new(true),
        })
    }

    // === Target vector (control plane writes, render path reads) ===

    /// Replace the whole target vector
    pub fn store_target(&self, target: ParameterTarget) {
        self.target.store(Arc::new(target));
    }

    /// Consistent copy of the current target vector (lock-free)
    pub fn load_target(&self) -> ParameterTarget {
        **self.target.load()
    }

    // === Frame snapshot (render path writes, visualization reads) ===

    /// Publish the latest mono block without ever waiting.
    ///
    /// Returns false when the reader held the lock and the block was skipped.
    pub fn publish_frame(&self, mono: &[f32]) -> bool {
        match self.frame.try_lock() {
            Some(mut frame) => {
                frame.samples.clear();
                frame.samples.extend_from_slice(mono);
                frame.sequence = frame.sequence.wrapping_add(1);
                true
            }
            None => {
                self.frames_skipped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Copy the latest mono block into `out`, returning its sequence number
    pub fn copy_frame(&self, out: &mut Vec<f32>) -> u64 {
        let frame = self.frame.lock();
        out.clear();
        out.extend_from_slice(&frame.samples);
        frame.sequence
    }

    /// Blocks the render path could not publish
    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped.load(Ordering::Relaxed)
    }

    // === Telemetry ===

    pub fn set_smoothed_volume(&self, volume: f32) {
        self.smoothed_volume.store(volume.to_bits(), Ordering::Relaxed);
    }

    /// Smoothed volume at the end of the last rendered block
    pub fn smoothed_volume(&self) -> f32 {
        f32::from_bits(self.smoothed_volume.load(Ordering::Relaxed))
    }

    // === Lifecycle ===

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask every cooperating loop to stop
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_swap_is_whole_vector() {
        let shared = SharedState::new(ParameterTarget::silent(110.0));
        let next = ParameterTarget {
            frequency: 560.0,
            volume: 0.4,
            pan: 0.5,
            timbre: 0.1,
        };
        shared.store_target(next);
        assert_eq!(shared.load_target(), next);
    }

    #[test]
    fn test_frame_publish_and_copy() {
        let shared = SharedState::new(ParameterTarget::silent(110.0));
        let mut out = Vec::new();
        assert_eq!(shared.copy_frame(&mut out), 0);
        assert!(out.is_empty());

        assert!(shared.publish_frame(&[0.1, 0.2, 0.3]));
        assert_eq!(shared.copy_frame(&mut out), 1);
        assert_eq!(out, vec![0.1, 0.2, 0.3]);

        // Latest value wins, no queueing
        shared.publish_frame(&[0.5]);
        shared.publish_frame(&[0.7]);
        assert_eq!(shared.copy_frame(&mut out), 3);
        assert_eq!(out, vec![0.7]);
    }

    #[test]
    fn test_publish_skips_while_reader_holds_lock() {
        let shared = SharedState::new(ParameterTarget::silent(110.0));
        let guard = shared.frame.lock();
        assert!(!shared.publish_frame(&[1.0]));
        drop(guard);

        assert_eq!(shared.frames_skipped(), 1);
        assert!(shared.publish_frame(&[1.0]));
    }

    #[test]
    fn test_concurrent_target_reads_never_tear() {
        let shared = SharedState::new(ParameterTarget::silent(0.0));
        let writer = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    let v = i as f32;
                    shared.store_target(ParameterTarget {
                        frequency: v,
                        volume: v,
                        pan: v,
                        timbre: v,
                    });
                }
            })
        };

        for _ in 0..10_000 {
            let t = shared.load_target();
            assert_eq!(t.frequency, t.volume);
            assert_eq!(t.pan, t.timbre);
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_shutdown_flag() {
        let shared = SharedState::new(ParameterTarget::silent(110.0));
        assert!(shared.is_running());
        shared.shutdown();
        assert!(!shared.is_running());
    }
}
