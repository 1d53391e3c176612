//! Audio output host.
//!
//! Opens the output device with cpal and pulls blocks from the synthesis
//! engine inside the device callback.

mod system;

// Re-export public types
pub use system::{AudioSystem, DeviceRenderer};
