//! Mix session: validation, the chunk loop and its termination rule.

use log::{debug, info};
use serde::Serialize;

use crate::audio::BitDepth;
use crate::codec::{ChunkSink, ChunkSource, OutputSpec, TrackInfo};
use crate::constants::{DEFAULT_BUFFER_CAPACITY, MAX_BUFFER_CAPACITY};
use crate::error::{MismatchedProperty, MixError, MixResult};

use super::ops;
use super::stats::LevelStats;
use super::track::{TrackFx, TrackState};

const SUPPORTED_SOURCE_BITS: [u16; 4] = [8, 16, 24, 32];

/// Options fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixSettings {
    pub bit_depth: BitDepth,
    /// Divide the mix by the number of configured tracks.
    pub attenuate: bool,
    /// Samples per track per chunk.
    pub buffer_capacity: usize,
    pub collect_stats: bool,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            bit_depth: BitDepth::default(),
            attenuate: false,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            collect_stats: true,
        }
    }
}

/// One input track: where its samples come from and what to do to them.
pub struct MixInput {
    pub source: Box<dyn ChunkSource>,
    pub fx: Option<TrackFx>,
}

impl MixInput {
    pub fn new(source: Box<dyn ChunkSource>, fx: Option<TrackFx>) -> Self {
        Self { source, fx }
    }
}

/// Stream layout shared by every track, taken from the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Outcome of a single loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixStep {
    /// A mix chunk of `len` samples was written. `last` is set when the
    /// chunk was short, which ends the session.
    Chunk { len: usize, last: bool },
    /// Every track was exhausted; nothing was written.
    Exhausted,
}

/// What a completed session produced.
#[derive(Debug, Clone, Serialize)]
pub struct MixSummary {
    pub format: SessionFormat,
    pub bit_depth: BitDepth,
    pub chunks: usize,
    /// Interleaved samples written, across all channels.
    pub samples: u64,
    pub stats: Option<LevelStats>,
}

/// Check that every track can be mixed with the others.
///
/// Tracks are checked in order and the first problem wins. Encoding and
/// bit depth are checked for a track before its layout is compared against
/// the first track's sample rate, then channel count.
pub fn validate_tracks<'a, I>(infos: I) -> MixResult<SessionFormat>
where
    I: IntoIterator<Item = &'a TrackInfo>,
{
    let mut format: Option<SessionFormat> = None;

    for (index, info) in infos.into_iter().enumerate() {
        if !info.encoding.is_integer_pcm() {
            return Err(MixError::UnsupportedEncoding {
                index,
                encoding: info.encoding,
            });
        }
        if !SUPPORTED_SOURCE_BITS.contains(&info.bit_depth) {
            return Err(MixError::UnsupportedBitDepth {
                index,
                bits: info.bit_depth,
            });
        }

        match format {
            None => {
                format = Some(SessionFormat {
                    sample_rate: info.sample_rate,
                    channels: info.channels,
                });
            }
            Some(expected) => {
                if info.sample_rate != expected.sample_rate {
                    return Err(MixError::FormatMismatch {
                        index,
                        property: MismatchedProperty::SampleRate,
                        expected: expected.sample_rate,
                        found: info.sample_rate,
                    });
                }
                if info.channels != expected.channels {
                    return Err(MixError::FormatMismatch {
                        index,
                        property: MismatchedProperty::ChannelCount,
                        expected: expected.channels as u32,
                        found: info.channels as u32,
                    });
                }
            }
        }
    }

    format.ok_or(MixError::NoTracks)
}

/// A single mixing run over a fixed set of tracks.
pub struct MixSession {
    settings: MixSettings,
    format: SessionFormat,
    sources: Vec<Box<dyn ChunkSource>>,
    tracks: Vec<TrackState>,
    accumulator: Vec<f64>,
    stats: Option<LevelStats>,
    chunks: usize,
    samples: u64,
    finished: bool,
}

impl MixSession {
    /// Validate the inputs and allocate per-track and mix buffers.
    ///
    /// No chunk is read here; a session that fails validation never
    /// touches its sources' sample data.
    pub fn new(inputs: Vec<MixInput>, settings: MixSettings) -> MixResult<Self> {
        if settings.buffer_capacity == 0 {
            return Err(MixError::InvalidConfig(
                "buffer capacity must be at least one sample".to_string(),
            ));
        }
        if settings.buffer_capacity > MAX_BUFFER_CAPACITY {
            return Err(MixError::InvalidConfig(format!(
                "buffer capacity {} exceeds the maximum of {}",
                settings.buffer_capacity, MAX_BUFFER_CAPACITY
            )));
        }
        let format = validate_tracks(inputs.iter().map(|input| input.source.info()))?;

        let capacity = settings.buffer_capacity;
        let mut sources = Vec::with_capacity(inputs.len());
        let mut tracks = Vec::with_capacity(inputs.len());
        for input in inputs {
            tracks.push(TrackState::new(input.source.info().bit_depth, input.fx, capacity));
            sources.push(input.source);
        }

        let stats = settings
            .collect_stats
            .then(|| LevelStats::new(tracks.len(), settings.bit_depth));

        info!(
            "mixing {} track(s) at {} Hz, {} channel(s) into {}",
            tracks.len(),
            format.sample_rate,
            format.channels,
            settings.bit_depth
        );

        Ok(Self {
            settings,
            format,
            sources,
            tracks,
            accumulator: vec![0.0; capacity],
            stats,
            chunks: 0,
            samples: 0,
            finished: false,
        })
    }

    pub fn format(&self) -> SessionFormat {
        self.format
    }

    pub fn settings(&self) -> MixSettings {
        self.settings
    }

    /// Layout the sink should be opened with.
    pub fn output_spec(&self) -> OutputSpec {
        OutputSpec {
            sample_rate: self.format.sample_rate,
            channels: self.format.channels,
            bit_depth: self.settings.bit_depth,
        }
    }

    pub fn tracks(&self) -> &[TrackState] {
        &self.tracks
    }

    pub fn stats(&self) -> Option<&LevelStats> {
        self.stats.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Run one iteration: refresh, transform, sum, attenuate, measure, write.
    ///
    /// Once a step returns [`MixStep::Exhausted`] or a chunk marked `last`,
    /// further calls return [`MixStep::Exhausted`] without reading.
    pub fn step(&mut self, sink: &mut dyn ChunkSink) -> MixResult<MixStep> {
        if self.finished {
            return Ok(MixStep::Exhausted);
        }

        let capacity = self.settings.buffer_capacity;
        for (track, source) in self.tracks.iter_mut().zip(self.sources.iter_mut()) {
            track.refresh(source.as_mut());
        }

        let round_len = self.tracks.iter().map(TrackState::len).max().unwrap_or(0);
        if round_len == 0 {
            debug!("all tracks exhausted after {} chunk(s)", self.chunks);
            self.finished = true;
            return Ok(MixStep::Exhausted);
        }

        let target_bits = self.settings.bit_depth.bits();
        for track in self.tracks.iter_mut() {
            track.prepare(target_bits);
        }

        ops::reset(&mut self.accumulator);
        let mix_len = ops::sum_into(&mut self.accumulator, self.tracks.iter().map(TrackState::samples));
        let mix = &mut self.accumulator[..mix_len];

        if self.settings.attenuate {
            ops::attenuate(mix, self.tracks.len());
        }

        if let Some(stats) = self.stats.as_mut() {
            stats.update(&self.tracks, mix);
        }

        sink.encode_chunk(mix)?;
        self.chunks += 1;
        self.samples += mix_len as u64;

        let last = round_len < capacity;
        debug!(
            "chunk {}: {} sample(s){}",
            self.chunks,
            mix_len,
            if last { ", final" } else { "" }
        );
        if last {
            self.finished = true;
        }

        Ok(MixStep::Chunk { len: mix_len, last })
    }

    /// Drive the session to completion and finalize the sink.
    pub fn run(mut self, sink: &mut dyn ChunkSink) -> MixResult<MixSummary> {
        while !self.finished {
            self.step(sink)?;
        }
        sink.finalize()?;

        info!(
            "wrote {} chunk(s), {} sample(s)",
            self.chunks, self.samples
        );

        Ok(MixSummary {
            format: self.format,
            bit_depth: self.settings.bit_depth,
            chunks: self.chunks,
            samples: self.samples,
            stats: self.stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{MemorySink, MemorySource, SampleEncoding};

    fn input(source: MemorySource) -> MixInput {
        MixInput::new(Box::new(source), None)
    }

    fn settings(bit_depth: BitDepth, attenuate: bool, capacity: usize) -> MixSettings {
        MixSettings {
            bit_depth,
            attenuate,
            buffer_capacity: capacity,
            collect_stats: true,
        }
    }

    #[test]
    fn uneven_tracks_mix_in_one_short_chunk() {
        let a = MemorySource::new(vec![1000; 5000], 16, 44_100, 1);
        let b = MemorySource::new(vec![-1000; 3000], 16, 44_100, 1);
        let session = MixSession::new(
            vec![input(a), input(b)],
            settings(BitDepth::Sixteen, true, 8000),
        )
        .expect("session");

        let mut sink = MemorySink::new();
        let summary = session.run(&mut sink).expect("run");

        assert_eq!(summary.chunks, 1);
        assert_eq!(sink.chunks.len(), 1);
        let mix = &sink.chunks[0];
        assert_eq!(mix.len(), 5000);
        assert!(mix[..3000].iter().all(|&s| s == 0.0));
        assert!(mix[3000..].iter().all(|&s| s == 500.0));
        assert!(sink.finalized);
    }

    #[test]
    fn equal_tracks_produce_equal_sample_counts() {
        let a = MemorySource::new(vec![10; 20_000], 16, 48_000, 2);
        let b = MemorySource::new(vec![20; 20_000], 16, 48_000, 2);
        let session = MixSession::new(
            vec![input(a), input(b)],
            settings(BitDepth::Sixteen, false, 8000),
        )
        .expect("session");

        let mut sink = MemorySink::new();
        let summary = session.run(&mut sink).expect("run");
        let lengths: Vec<usize> = sink.chunks.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![8000, 8000, 4000]);
        assert_eq!(summary.samples, 20_000);
        assert!(sink.samples().iter().all(|&s| s == 30.0));
    }

    #[test]
    fn short_input_ends_after_exactly_one_chunk() {
        let a = MemorySource::new(vec![1; 100], 16, 48_000, 1);
        let reads = a.read_counter();
        let session =
            MixSession::new(vec![input(a)], settings(BitDepth::Sixteen, false, 8000)).expect("session");
        let mut sink = MemorySink::new();
        let summary = session.run(&mut sink).expect("run");
        assert_eq!(summary.chunks, 1);
        assert_eq!(reads.get(), 1);
    }

    #[test]
    fn exact_multiple_of_capacity_stops_on_empty_round() {
        let a = MemorySource::new(vec![1; 16], 16, 48_000, 1);
        let reads = a.read_counter();
        let mut session =
            MixSession::new(vec![input(a)], settings(BitDepth::Sixteen, false, 8)).expect("session");
        let mut sink = MemorySink::new();

        assert_eq!(session.step(&mut sink).unwrap(), MixStep::Chunk { len: 8, last: false });
        assert_eq!(session.step(&mut sink).unwrap(), MixStep::Chunk { len: 8, last: false });
        assert_eq!(session.step(&mut sink).unwrap(), MixStep::Exhausted);
        assert!(session.is_finished());
        assert_eq!(session.step(&mut sink).unwrap(), MixStep::Exhausted);
        assert_eq!(reads.get(), 3);
        assert_eq!(sink.chunks.len(), 2);
    }

    #[test]
    fn longer_track_continues_after_shorter_retires() {
        let a = MemorySource::new(vec![1000; 20], 16, 48_000, 1);
        let b = MemorySource::new(vec![1000; 5], 16, 48_000, 1);
        let session = MixSession::new(
            vec![input(a), input(b)],
            settings(BitDepth::Sixteen, true, 8),
        )
        .expect("session");

        let mut sink = MemorySink::new();
        let summary = session.run(&mut sink).expect("run");
        let lengths: Vec<usize> = sink.chunks.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![8, 8, 4]);
        assert_eq!(summary.samples, 20);

        // Attenuation keeps dividing by both tracks once the short one is gone.
        assert_eq!(&sink.chunks[0][..5], &[1000.0; 5]);
        assert_eq!(&sink.chunks[0][5..], &[500.0; 3]);
        assert!(sink.chunks[1].iter().all(|&s| s == 500.0));
        assert!(sink.chunks[2].iter().all(|&s| s == 500.0));
    }

    #[test]
    fn rescales_sources_to_target_depth() {
        let a = MemorySource::new(vec![1000; 4], 16, 48_000, 1);
        let b = MemorySource::new(vec![256_000; 4], 24, 48_000, 1);
        let session = MixSession::new(
            vec![input(a), input(b)],
            settings(BitDepth::TwentyFour, false, 8),
        )
        .expect("session");
        assert_eq!(
            session.format(),
            SessionFormat {
                sample_rate: 48_000,
                channels: 1
            }
        );
        let depths: Vec<u16> = session.tracks().iter().map(TrackState::bit_depth).collect();
        assert_eq!(depths, vec![16, 24]);

        let mut sink = MemorySink::new();
        session.run(&mut sink).expect("run");
        assert_eq!(sink.samples(), vec![512_000.0; 4]);
    }

    #[test]
    fn applies_track_fx_before_summing() {
        let a = MemorySource::new(vec![1000; 4], 16, 48_000, 1);
        let b = MemorySource::new(vec![1000; 4], 16, 48_000, 1);
        let session = MixSession::new(
            vec![
                MixInput::new(Box::new(a), Some(TrackFx::new(0.5, false))),
                MixInput::new(Box::new(b), Some(TrackFx::new(1.0, true))),
            ],
            settings(BitDepth::Sixteen, false, 8),
        )
        .expect("session");
        assert_eq!(session.tracks()[0].fx(), Some(&TrackFx::new(0.5, false)));
        assert_eq!(session.tracks()[1].fx(), Some(&TrackFx::new(1.0, true)));

        let mut sink = MemorySink::new();
        session.run(&mut sink).expect("run");
        assert_eq!(sink.samples(), vec![-500.0; 4]);
    }

    #[test]
    fn stats_cover_tracks_and_mix() {
        let a = MemorySource::new(vec![20_000; 6], 16, 48_000, 1);
        let b = MemorySource::new(vec![20_000; 6], 16, 48_000, 1);
        let session = MixSession::new(
            vec![input(a), input(b)],
            settings(BitDepth::Sixteen, false, 4),
        )
        .expect("session");
        let mut sink = MemorySink::new();
        let summary = session.run(&mut sink).expect("run");

        let stats = summary.stats.expect("stats");
        assert_eq!(stats.tracks.len(), 2);
        for track in &stats.tracks {
            assert_eq!(track.sample_count, 6);
            assert_eq!(track.clipped_count, 0);
            assert_eq!(track.peak, 20_000.0);
        }
        assert_eq!(stats.mix.sample_count, 6);
        assert_eq!(stats.mix.clipped_count, 6);
        assert_eq!(stats.mix.peak, 40_000.0);
        // The sink clamps, but stats see the unclamped mix.
        assert!(stats.mix.peak_db > 0.0);
    }

    #[test]
    fn stats_can_be_disabled() {
        let a = MemorySource::new(vec![1; 4], 16, 48_000, 1);
        let mut config = settings(BitDepth::Sixteen, false, 8);
        config.collect_stats = false;
        let session = MixSession::new(vec![input(a)], config).expect("session");
        let mut sink = MemorySink::new();
        assert!(session.run(&mut sink).expect("run").stats.is_none());
    }

    #[test]
    fn mid_stream_read_error_ends_that_track_quietly() {
        let a = MemorySource::new(vec![100; 20], 16, 48_000, 1).failing_on_read(1);
        let b = MemorySource::new(vec![100; 20], 16, 48_000, 1);
        let session = MixSession::new(
            vec![input(a), input(b)],
            settings(BitDepth::Sixteen, false, 8),
        )
        .expect("session");
        let mut sink = MemorySink::new();
        session.run(&mut sink).expect("run");
        assert_eq!(sink.chunks[0], vec![200.0; 8]);
        assert_eq!(sink.chunks[1], vec![100.0; 8]);
        assert_eq!(sink.chunks[2], vec![100.0; 4]);
    }

    #[test]
    fn float_track_is_rejected_before_reading() {
        let a = MemorySource::new(vec![1; 100], 32, 48_000, 1).with_encoding(SampleEncoding::IeeeFloat);
        let reads = a.read_counter();
        let result = MixSession::new(vec![input(a)], MixSettings::default());
        match result {
            Err(MixError::UnsupportedEncoding { index, encoding }) => {
                assert_eq!(index, 0);
                assert_eq!(encoding, SampleEncoding::IeeeFloat);
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
        assert_eq!(reads.get(), 0);
    }

    #[test]
    fn companded_encodings_are_named() {
        let a = MemorySource::new(vec![1; 4], 16, 48_000, 1);
        let b = MemorySource::new(vec![1; 4], 8, 48_000, 1).with_encoding(SampleEncoding::MuLaw);
        let err = MixSession::new(vec![input(a), input(b)], MixSettings::default())
            .err()
            .expect("error");
        assert_eq!(err.to_string(), "track 1: µ-law is not currently supported");
    }

    #[test]
    fn sample_rate_mismatch_is_rejected_before_reading() {
        let a = MemorySource::new(vec![1; 100], 16, 44_100, 2);
        let b = MemorySource::new(vec![1; 100], 16, 48_000, 2);
        let (reads_a, reads_b) = (a.read_counter(), b.read_counter());
        let err = MixSession::new(vec![input(a), input(b)], MixSettings::default())
            .err()
            .expect("error");
        match err {
            MixError::FormatMismatch {
                index,
                property,
                expected,
                found,
            } => {
                assert_eq!(index, 1);
                assert_eq!(property, MismatchedProperty::SampleRate);
                assert_eq!((expected, found), (44_100, 48_000));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(reads_a.get() + reads_b.get(), 0);
    }

    #[test]
    fn channel_mismatch_names_first_offending_track() {
        let a = MemorySource::new(vec![1; 4], 16, 48_000, 2);
        let b = MemorySource::new(vec![1; 4], 24, 48_000, 2);
        let c = MemorySource::new(vec![1; 4], 16, 48_000, 1);
        let d = MemorySource::new(vec![1; 4], 16, 44_100, 2);
        let err = MixSession::new(
            vec![input(a), input(b), input(c), input(d)],
            MixSettings::default(),
        )
        .err()
        .expect("error");
        assert!(matches!(
            err,
            MixError::FormatMismatch {
                index: 2,
                property: MismatchedProperty::ChannelCount,
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_sessions_and_zero_capacity() {
        assert!(matches!(
            MixSession::new(Vec::new(), MixSettings::default()),
            Err(MixError::NoTracks)
        ));
        let a = MemorySource::new(vec![1; 4], 16, 48_000, 1);
        let mut config = MixSettings::default();
        config.buffer_capacity = 0;
        assert!(matches!(
            MixSession::new(vec![input(a)], config),
            Err(MixError::InvalidConfig(_))
        ));
    }

    #[test]
    fn oversized_capacity_is_rejected_without_allocating() {
        for capacity in [MAX_BUFFER_CAPACITY + 1, usize::MAX] {
            let a = MemorySource::new(vec![1; 4], 16, 48_000, 1);
            let reads = a.read_counter();
            let mut config = MixSettings::default();
            config.buffer_capacity = capacity;
            match MixSession::new(vec![input(a)], config) {
                Err(MixError::InvalidConfig(message)) => assert!(message.contains("exceeds")),
                other => panic!("unexpected result: {:?}", other.err()),
            }
            assert_eq!(reads.get(), 0);
        }
    }
}
