//! Spectral export for the waterfall display.
//!
//! Takes the most recently rendered block, produces a normalized magnitude
//! row, and keeps a scrolling history of rows.

mod analyzer;
mod waterfall;

// Re-export public types
pub use analyzer::{hann_window, resample_linear, SpectralAnalyzer, NORMALIZE_EPSILON};
pub use waterfall::{colorize, Waterfall};
