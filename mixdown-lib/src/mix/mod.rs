//! The streaming mixing engine.
//!
//! A [`MixSession`] owns one [`TrackState`] per input plus a shared mix
//! accumulator. Each iteration refreshes every track's chunk, applies the
//! [`ops`] transforms, sums, optionally attenuates, updates [`LevelStats`]
//! and hands the mix chunk to a sink.

pub mod ops;
mod session;
mod stats;
mod track;

pub use session::{validate_tracks, MixInput, MixSession, MixSettings, MixStep, MixSummary, SessionFormat};
pub use stats::{LevelStats, TrackStats};
pub use track::{ChunkState, TrackFx, TrackState};
