//! JSON mix plans: the inputs of a session and how to mix them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audio::BitDepth;
use crate::codec::PcmFileSource;
use crate::constants::DEFAULT_BUFFER_CAPACITY;
use crate::error::MixResult;
use crate::mix::{validate_tracks, MixInput, MixSettings, TrackFx};

/// One input file and its effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTrack {
    pub path: String,
    #[serde(flatten)]
    pub fx: TrackFx,
}

impl PlanTrack {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fx: TrackFx::default(),
        }
    }
}

/// A complete description of a mix.
///
/// Every field except `tracks` has a default, so `{"tracks": [...]}` is a
/// valid plan. A `buffer` of `0` means the default capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixPlan {
    pub tracks: Vec<PlanTrack>,
    pub bits: BitDepth,
    pub attenuate: bool,
    pub buffer: usize,
    pub stats: bool,
}

impl Default for MixPlan {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            bits: BitDepth::default(),
            attenuate: false,
            buffer: DEFAULT_BUFFER_CAPACITY,
            stats: true,
        }
    }
}

impl MixPlan {
    /// Parse a plan from a JSON string.
    pub fn from_json_str(json: &str) -> MixResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a plan file.
    pub fn from_path(path: impl AsRef<Path>) -> MixResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// A two-track plan showing every option, for `create plan-json`.
    pub fn example() -> Self {
        let mut vocals = PlanTrack::new("vocals.wav");
        vocals.fx.gain = 0.5;
        let mut room = PlanTrack::new("room.wav");
        room.fx.invert = true;
        Self {
            tracks: vec![vocals, room],
            attenuate: true,
            ..Self::default()
        }
    }

    /// Pretty-printed JSON for this plan.
    pub fn to_json(&self) -> MixResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Session settings described by this plan.
    pub fn settings(&self) -> MixSettings {
        MixSettings {
            bit_depth: self.bits,
            attenuate: self.attenuate,
            buffer_capacity: if self.buffer == 0 {
                DEFAULT_BUFFER_CAPACITY
            } else {
                self.buffer
            },
            collect_stats: self.stats,
        }
    }

    /// Open every track file, in plan order.
    ///
    /// Each track is checked against the ones before it as soon as it is
    /// opened, so the reported problem is always the earliest one.
    ///
    /// # Errors
    /// Fails on the first file that cannot be opened or probed, or that
    /// cannot be mixed with the tracks before it.
    pub fn open_inputs(&self) -> MixResult<Vec<MixInput>> {
        let mut inputs: Vec<MixInput> = Vec::with_capacity(self.tracks.len());
        for track in &self.tracks {
            let source = PcmFileSource::open(&track.path)?;
            inputs.push(MixInput::new(Box::new(source), track.fx.into_option()));
            validate_tracks(inputs.iter().map(|input| input.source.info()))?;
        }
        Ok(inputs)
    }

    /// Labels used when reporting per-track results.
    pub fn labels(&self) -> Vec<String> {
        self.tracks.iter().map(|track| track.path.clone()).collect()
    }
}
