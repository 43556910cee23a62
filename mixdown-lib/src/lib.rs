//! # Mixdown Library
//!
//! Streaming mixer for time-aligned integer PCM tracks. Tracks are read in
//! fixed-size chunks, rescaled to a common bit depth, shaped by per-track
//! gain and polarity, summed, optionally attenuated, measured and handed to
//! an encoder one chunk at a time.

pub mod audio;
pub mod codec;
pub mod constants;
pub mod dsp;
pub mod error;
pub mod mix;
pub mod plan;
pub mod report;

pub use error::{MismatchedProperty, MixError, MixResult};
