//! Gain values: decibel conversions and the `0.5` / `-6dB` notation used
//! by the command line and mix plans.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Linear multiplier for a level change in dB.
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Level in dB of an amplitude ratio. Zero maps to negative infinity.
pub fn ratio_to_db(ratio: f64) -> f64 {
    20.0 * ratio.log10()
}

/// Read a gain as a linear multiplier.
///
/// Plain numbers are multipliers; a `dB` suffix (any case) marks a level
/// change. Results that are not finite are rejected.
pub fn parse_gain(text: &str) -> Option<f64> {
    let lower = text.trim().to_ascii_lowercase();
    let gain = match lower.strip_suffix("db") {
        Some(db) => db_to_linear(db.trim_end().parse().ok()?),
        None => lower.parse().ok()?,
    };
    gain.is_finite().then_some(gain)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GainNotation {
    Multiplier(f64),
    Text(String),
}

/// Serde hook for gain fields written either as a number or as a string
/// understood by [`parse_gain`].
pub fn deserialize_gain<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match GainNotation::deserialize(deserializer)? {
        GainNotation::Multiplier(gain) => Ok(gain),
        GainNotation::Text(text) => parse_gain(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid gain \"{}\"", text))),
    }
}
