//! Output sinks for mixed chunks.

use std::fs::File;
use std::io::{BufWriter, Write};

use log::debug;
use serde::Serialize;

use crate::audio::BitDepth;
use crate::error::{MixError, MixResult};

use super::ChunkSink;

const WAVE_FORMAT_PCM: u16 = 1;
const STREAMING_CHUNK_SIZE: u32 = u32::MAX;

/// Stream layout of the mix output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: BitDepth,
}

impl OutputSpec {
    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bit_depth.bits(),
            sample_format: hound::SampleFormat::Int,
        }
    }

    fn block_align(&self) -> u16 {
        self.channels * (self.bit_depth.bits() / 8)
    }
}

/// Round a mixed sample to the nearest integer and clamp it to the target range.
pub fn quantize(sample: f64, bit_depth: BitDepth) -> i32 {
    if sample.is_nan() {
        return 0;
    }
    let min = bit_depth.min_sample() as f64;
    let max = bit_depth.max_sample() as f64;
    sample.round().clamp(min, max) as i32
}

/// WAV file output written through `hound`.
pub struct WavFileSink {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    bit_depth: BitDepth,
}

impl WavFileSink {
    /// Create (or truncate) a WAV file at `path`.
    pub fn create(path: &str, spec: OutputSpec) -> MixResult<Self> {
        let writer = hound::WavWriter::create(path, spec.wav_spec())?;
        debug!("writing {} {} channel(s) at {} Hz to {}", spec.bit_depth, spec.channels, spec.sample_rate, path);
        Ok(Self {
            writer: Some(writer),
            bit_depth: spec.bit_depth,
        })
    }
}

impl ChunkSink for WavFileSink {
    fn encode_chunk(&mut self, samples: &[f64]) -> MixResult<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| MixError::Encode("wav writer already finalized".to_string()))?;
        for &sample in samples {
            writer.write_sample(quantize(sample, self.bit_depth))?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> MixResult<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }
}

/// WAV output for non-seekable writers such as stdout.
///
/// The RIFF and data chunk sizes cannot be patched after the fact, so the
/// header declares them as `0xFFFFFFFF`, which streaming readers treat as
/// "until end of stream".
pub struct WavStreamSink<W: Write> {
    writer: Option<W>,
    spec: OutputSpec,
    header_written: bool,
    finalized: bool,
}

impl<W: Write> WavStreamSink<W> {
    pub fn new(writer: W, spec: OutputSpec) -> Self {
        Self {
            writer: Some(writer),
            spec,
            header_written: false,
            finalized: false,
        }
    }

    fn write_header(spec: &OutputSpec, writer: &mut W) -> MixResult<()> {
        let bits = spec.bit_depth.bits();
        let block_align = spec.block_align();
        let byte_rate = spec.sample_rate * block_align as u32;

        writer.write_all(b"RIFF")?;
        writer.write_all(&STREAMING_CHUNK_SIZE.to_le_bytes())?;
        writer.write_all(b"WAVE")?;
        writer.write_all(b"fmt ")?;
        writer.write_all(&16_u32.to_le_bytes())?;
        writer.write_all(&WAVE_FORMAT_PCM.to_le_bytes())?;
        writer.write_all(&spec.channels.to_le_bytes())?;
        writer.write_all(&spec.sample_rate.to_le_bytes())?;
        writer.write_all(&byte_rate.to_le_bytes())?;
        writer.write_all(&block_align.to_le_bytes())?;
        writer.write_all(&bits.to_le_bytes())?;
        writer.write_all(b"data")?;
        writer.write_all(&STREAMING_CHUNK_SIZE.to_le_bytes())?;
        Ok(())
    }

    /// Return the underlying writer once the sink is no longer needed.
    pub fn into_inner(mut self) -> Option<W> {
        self.writer.take()
    }
}

impl<W: Write> ChunkSink for WavStreamSink<W> {
    fn encode_chunk(&mut self, samples: &[f64]) -> MixResult<()> {
        let writer = self
            .writer
            .as_mut()
            .filter(|_| !self.finalized)
            .ok_or_else(|| MixError::Encode("wav stream already finalized".to_string()))?;
        if !self.header_written {
            Self::write_header(&self.spec, writer)?;
            self.header_written = true;
        }

        let bytes_per_sample = (self.spec.bit_depth.bits() / 8) as usize;
        let mut bytes = Vec::with_capacity(samples.len() * bytes_per_sample);
        for &sample in samples {
            let value = quantize(sample, self.spec.bit_depth).to_le_bytes();
            bytes.extend_from_slice(&value[..bytes_per_sample]);
        }
        writer.write_all(&bytes)?;
        Ok(())
    }

    fn finalize(&mut self) -> MixResult<()> {
        if let Some(writer) = self.writer.as_mut() {
            if !self.header_written {
                Self::write_header(&self.spec, writer)?;
                self.header_written = true;
            }
            writer.flush()?;
        }
        self.finalized = true;
        Ok(())
    }
}

/// Sink that discards every chunk, for measuring a mix without writing it.
#[derive(Debug, Default)]
pub struct NullSink;

impl ChunkSink for NullSink {
    fn encode_chunk(&mut self, _samples: &[f64]) -> MixResult<()> {
        Ok(())
    }

    fn finalize(&mut self) -> MixResult<()> {
        Ok(())
    }
}
