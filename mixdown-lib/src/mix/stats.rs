//! Running level statistics for tracks and the mix.

use serde::Serialize;

use crate::audio::BitDepth;
use crate::dsp::gain::ratio_to_db;

use super::track::TrackState;

/// Accumulated levels for one stream.
///
/// Accumulators only grow; the dB figures are recomputed from them after
/// every chunk. Both dB values are relative to the target bit depth's full
/// scale and are negative infinity until a non-zero sample is seen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackStats {
    pub sample_count: u64,
    pub clipped_count: u64,
    pub peak: f64,
    pub sum_of_squares: f64,
    pub peak_db: f64,
    pub rms_db: f64,
}

impl Default for TrackStats {
    fn default() -> Self {
        Self {
            sample_count: 0,
            clipped_count: 0,
            peak: 0.0,
            sum_of_squares: 0.0,
            peak_db: f64::NEG_INFINITY,
            rms_db: f64::NEG_INFINITY,
        }
    }
}

impl TrackStats {
    /// Fold a chunk of samples into the running totals.
    pub fn accumulate(&mut self, samples: &[f64], bit_depth: BitDepth) {
        if samples.is_empty() {
            return;
        }
        for &sample in samples {
            let magnitude = sample.abs();
            if magnitude > self.peak {
                self.peak = magnitude;
            }
            if bit_depth.clips(sample) {
                self.clipped_count += 1;
            }
            self.sum_of_squares += sample * sample;
        }
        self.sample_count += samples.len() as u64;

        let full_scale = bit_depth.full_scale();
        self.peak_db = ratio_to_db(self.peak / full_scale);
        self.rms_db = ratio_to_db(self.rms() / full_scale);
    }

    /// Root mean square over every sample seen so far.
    pub fn rms(&self) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }
        (self.sum_of_squares / self.sample_count as f64).sqrt()
    }
}

/// Level statistics for every track plus the mix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelStats {
    pub bit_depth: BitDepth,
    pub tracks: Vec<TrackStats>,
    pub mix: TrackStats,
}

impl LevelStats {
    pub fn new(track_count: usize, bit_depth: BitDepth) -> Self {
        Self {
            bit_depth,
            tracks: vec![TrackStats::default(); track_count],
            mix: TrackStats::default(),
        }
    }

    /// Measure the current chunk of every active track, then the mix chunk.
    ///
    /// Track samples are measured as they enter the sum (after rescaling
    /// and effects). `mix` is the attenuated mix chunk.
    pub fn update(&mut self, tracks: &[TrackState], mix: &[f64]) {
        for (stats, track) in self.tracks.iter_mut().zip(tracks) {
            stats.accumulate(track.samples(), self.bit_depth);
        }
        self.mix.accumulate(mix, self.bit_depth);
    }
}
