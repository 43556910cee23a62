//! Shared defaults for mixing sessions.

/// Samples (interleaved, across all channels) read per track per chunk.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8000;

/// Bit depth of the mix when none is configured.
pub const DEFAULT_BIT_DEPTH: u16 = 24;

/// Largest accepted chunk capacity.
pub const MAX_BUFFER_CAPACITY: usize = i32::MAX as usize;
