//! Audio engine constants.

/// Audio constants (compile-time defaults for the render path)
pub mod audio_constants {
    /// Sample rate used when no device dictates one (offline rendering, tests)
    pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 44100;

    /// Render block size (frames per smoothing step)
    /// 256 frames = 5.8ms @ 44.1kHz
    pub const BLOCK_SIZE: usize = 256;

    /// Fixed headroom applied to the voice sum before the volume envelope
    pub const MIX_HEADROOM: f32 = 0.5;

    /// Smoothed volume below this counts as silent (watchdog Idle)
    pub const IDLE_VOLUME_EPSILON: f32 = 1e-4;

    /// Smoothed values this close to their target snap onto it
    pub const SNAP_EPSILON: f32 = 1e-6;
}
