//! Target bit depths and their integer ranges.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_BIT_DEPTH;
use crate::error::MixError;

/// Bit depth of a mix.
///
/// Serialized as the plain number of bits (`16`, `24` or `32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BitDepth {
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl BitDepth {
    /// Number of bits per sample.
    pub const fn bits(self) -> u16 {
        match self {
            Self::Sixteen => 16,
            Self::TwentyFour => 24,
            Self::ThirtyTwo => 32,
        }
    }

    /// Largest representable sample value.
    pub fn max_sample(self) -> i32 {
        ((1_i64 << (self.bits() - 1)) - 1) as i32
    }

    /// Smallest representable sample value.
    pub fn min_sample(self) -> i32 {
        (-(1_i64 << (self.bits() - 1))) as i32
    }

    /// Full-scale magnitude used as the 0 dBFS reference (32767 for 16-bit).
    pub fn full_scale(self) -> f64 {
        self.max_sample() as f64
    }

    /// Whether a sample falls outside the representable range.
    ///
    /// The check is symmetric around zero: only magnitudes strictly above
    /// [`BitDepth::full_scale`] count as clipped.
    pub fn clips(self, sample: f64) -> bool {
        sample.abs() > self.full_scale()
    }
}

impl Default for BitDepth {
    fn default() -> Self {
        Self::TwentyFour
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = MixError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            16 => Ok(Self::Sixteen),
            24 => Ok(Self::TwentyFour),
            32 => Ok(Self::ThirtyTwo),
            other => Err(MixError::InvalidConfig(format!(
                "bit depth must be 16, 24 or 32 (got {})",
                other
            ))),
        }
    }
}

impl From<BitDepth> for u16 {
    fn from(value: BitDepth) -> Self {
        value.bits()
    }
}

impl Display for BitDepth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}
