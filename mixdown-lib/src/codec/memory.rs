//! In-memory sources and sinks.
//!
//! Useful for mixing synthesized tracks and for exercising sessions
//! without touching the filesystem.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{MixError, MixResult};

use super::{ChunkSink, ChunkSource, SampleEncoding, TrackInfo};

/// A track backed by a vector of raw integer samples.
#[derive(Debug, Clone)]
pub struct MemorySource {
    info: TrackInfo,
    samples: Vec<i32>,
    position: usize,
    reads: Rc<Cell<usize>>,
    fail_on_read: Option<usize>,
}

impl MemorySource {
    /// Signed integer PCM at `bit_depth`.
    pub fn new(samples: Vec<i32>, bit_depth: u16, sample_rate: u32, channels: u16) -> Self {
        let frames = (samples.len() / channels.max(1) as usize) as u64;
        Self {
            info: TrackInfo {
                encoding: SampleEncoding::SignedPcm,
                bit_depth,
                sample_rate,
                channels,
                frames: Some(frames),
            },
            samples,
            position: 0,
            reads: Rc::new(Cell::new(0)),
            fail_on_read: None,
        }
    }

    /// Report a different encoding, e.g. to stand in for a float file.
    pub fn with_encoding(mut self, encoding: SampleEncoding) -> Self {
        self.info.encoding = encoding;
        self
    }

    /// Fail the `n`th call to `decode_chunk` (zero-based) with a decode error.
    pub fn failing_on_read(mut self, n: usize) -> Self {
        self.fail_on_read = Some(n);
        self
    }

    /// Shared counter of `decode_chunk` calls, readable after the source
    /// has been moved into a session.
    pub fn read_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.reads)
    }
}

impl ChunkSource for MemorySource {
    fn info(&self) -> &TrackInfo {
        &self.info
    }

    fn decode_chunk(&mut self, out: &mut [i32]) -> MixResult<usize> {
        let read_index = self.reads.get();
        self.reads.set(read_index + 1);
        if self.fail_on_read == Some(read_index) {
            return Err(MixError::Decode(format!("simulated failure on read {}", read_index)));
        }

        let remaining = &self.samples[self.position..];
        let count = remaining.len().min(out.len());
        out[..count].copy_from_slice(&remaining[..count]);
        self.position += count;
        Ok(count)
    }
}

/// A sink that keeps every chunk it receives.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub chunks: Vec<Vec<f64>>,
    pub finalized: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All received samples, concatenated.
    pub fn samples(&self) -> Vec<f64> {
        self.chunks.iter().flatten().copied().collect()
    }
}

impl ChunkSink for MemorySink {
    fn encode_chunk(&mut self, samples: &[f64]) -> MixResult<()> {
        if self.finalized {
            return Err(MixError::Encode("sink already finalized".to_string()));
        }
        self.chunks.push(samples.to_vec());
        Ok(())
    }

    fn finalize(&mut self) -> MixResult<()> {
        self.finalized = true;
        Ok(())
    }
}
