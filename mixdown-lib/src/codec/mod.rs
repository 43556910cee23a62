//! Codec seams for the mixer.
//!
//! The mixing engine never touches a container directly. It pulls raw
//! integer samples through [`ChunkSource`] and pushes mixed float samples
//! through [`ChunkSink`]. File-backed implementations live in [`source`]
//! and [`sink`]; [`memory`] holds in-memory ones.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::error::MixResult;

mod convert;
pub mod memory;
pub mod sink;
pub mod source;

pub use memory::{MemorySink, MemorySource};
pub use sink::{NullSink, OutputSpec, WavFileSink, WavStreamSink};
pub use source::PcmFileSource;

/// How samples are encoded in a source container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SampleEncoding {
    SignedPcm,
    /// Offset-binary integer PCM, as used by 8-bit WAV.
    UnsignedPcm,
    IeeeFloat,
    ALaw,
    MuLaw,
    /// Any other codec, by its short name.
    Other(&'static str),
}

impl SampleEncoding {
    /// Whether the mixer can consume samples in this encoding.
    pub fn is_integer_pcm(self) -> bool {
        matches!(self, Self::SignedPcm | Self::UnsignedPcm)
    }
}

impl Display for SampleEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignedPcm => write!(f, "signed PCM"),
            Self::UnsignedPcm => write!(f, "unsigned PCM"),
            Self::IeeeFloat => write!(f, "IEEE float"),
            Self::ALaw => write!(f, "A-law"),
            Self::MuLaw => write!(f, "µ-law"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Static metadata reported by a source before any chunk is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    pub encoding: SampleEncoding,
    pub bit_depth: u16,
    pub sample_rate: u32,
    pub channels: u16,
    /// Frame count when the container declares one.
    pub frames: Option<u64>,
}

/// Chunked decoder for a single input track.
pub trait ChunkSource {
    /// Metadata describing the samples this source yields.
    fn info(&self) -> &TrackInfo;

    /// Fill `out` with the next interleaved samples.
    ///
    /// Samples are signed integers at [`TrackInfo::bit_depth`]. Returns `0`
    /// at end of stream, otherwise the number of slots written (at most
    /// `out.len()`).
    fn decode_chunk(&mut self, out: &mut [i32]) -> MixResult<usize>;
}

/// Chunked encoder for the mix output.
pub trait ChunkSink {
    /// Encode interleaved samples expressed in the units of the target bit
    /// depth. Values outside the target range are clamped here.
    fn encode_chunk(&mut self, samples: &[f64]) -> MixResult<()>;

    /// Flush and close the output. Further chunks are rejected.
    fn finalize(&mut self) -> MixResult<()>;
}
