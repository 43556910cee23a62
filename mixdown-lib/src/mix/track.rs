//! Per-track chunk state and effects.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::codec::ChunkSource;
use crate::dsp::gain::deserialize_gain;

use super::ops;

const DEFAULT_GAIN: f64 = 1.0;

/// Per-track effects applied before summation: gain, then polarity invert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackFx {
    #[serde(deserialize_with = "deserialize_gain")]
    pub gain: f64,
    pub invert: bool,
}

impl TrackFx {
    pub fn new(gain: f64, invert: bool) -> Self {
        Self { gain, invert }
    }

    /// Whether applying these effects would leave samples untouched.
    pub fn is_identity(&self) -> bool {
        self.gain == DEFAULT_GAIN && !self.invert
    }

    /// `None` when the effects are an identity, so callers can skip them.
    pub fn into_option(self) -> Option<Self> {
        if self.is_identity() {
            None
        } else {
            Some(self)
        }
    }
}

impl Default for TrackFx {
    fn default() -> Self {
        Self {
            gain: DEFAULT_GAIN,
            invert: false,
        }
    }
}

/// Lifecycle of a track's current chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// No chunk requested yet.
    NotStarted,
    /// The current chunk holds this many valid samples.
    Active(usize),
    /// Permanently finished; the source is never read again.
    Exhausted,
}

impl ChunkState {
    /// Valid samples in the current chunk (zero unless active).
    pub fn len(self) -> usize {
        match self {
            Self::Active(len) => len,
            Self::NotStarted | Self::Exhausted => 0,
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn is_exhausted(self) -> bool {
        self == Self::Exhausted
    }
}

/// One track's current chunk, its source bit depth and its effects.
#[derive(Debug, Clone)]
pub struct TrackState {
    bit_depth: u16,
    fx: Option<TrackFx>,
    chunk: ChunkState,
    raw: Vec<i32>,
    samples: Vec<f64>,
}

impl TrackState {
    /// Allocate a track with chunk buffers of `capacity` samples.
    pub fn new(bit_depth: u16, fx: Option<TrackFx>, capacity: usize) -> Self {
        Self {
            bit_depth,
            fx,
            chunk: ChunkState::NotStarted,
            raw: vec![0; capacity],
            samples: vec![0.0; capacity],
        }
    }

    pub fn bit_depth(&self) -> u16 {
        self.bit_depth
    }

    pub fn fx(&self) -> Option<&TrackFx> {
        self.fx.as_ref()
    }

    pub fn chunk(&self) -> ChunkState {
        self.chunk
    }

    /// Valid samples this chunk.
    pub fn len(&self) -> usize {
        self.chunk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// The valid part of the current chunk.
    pub fn samples(&self) -> &[f64] {
        &self.samples[..self.chunk.len()]
    }

    pub fn samples_mut(&mut self) -> &mut [f64] {
        let len = self.chunk.len();
        &mut self.samples[..len]
    }

    /// Advance to the next chunk.
    ///
    /// A track whose previous chunk was shorter than capacity is retired
    /// without being read again. A read of zero samples, or a read error,
    /// also retires the track.
    pub fn refresh(&mut self, source: &mut dyn ChunkSource) -> ChunkState {
        match self.chunk {
            ChunkState::Exhausted => return self.chunk,
            ChunkState::Active(len) if len < self.capacity() => {
                self.chunk = ChunkState::Exhausted;
                return self.chunk;
            }
            ChunkState::NotStarted | ChunkState::Active(_) => {}
        }

        let count = match source.decode_chunk(&mut self.raw) {
            Ok(count) => count.min(self.raw.len()),
            Err(err) => {
                debug!("treating read error as end of stream: {}", err);
                0
            }
        };

        if count == 0 {
            self.chunk = ChunkState::Exhausted;
            return self.chunk;
        }

        for (sample, &raw) in self.samples.iter_mut().zip(&self.raw[..count]) {
            *sample = raw as f64;
        }
        self.chunk = ChunkState::Active(count);
        self.chunk
    }

    /// Rescale the current chunk to `target_bits` and apply the track's effects.
    pub fn prepare(&mut self, target_bits: u16) {
        let source_bits = self.bit_depth;
        let fx = self.fx;
        let samples = self.samples_mut();
        ops::scale(samples, source_bits, target_bits);
        ops::apply_fx(samples, fx.as_ref());
    }
}
