//! Numeric transforms over chunks of samples.
//!
//! Samples are `f64` values in the integer units of some bit depth. None of
//! these functions round or clamp; that happens when a sink encodes.

use super::track::TrackFx;

/// Multiplier that maps full scale at `src_bits` onto full scale at `dst_bits`.
pub fn scale_factor(src_bits: u16, dst_bits: u16) -> f64 {
    2_f64.powi(dst_bits as i32 - src_bits as i32)
}

/// Rescale samples from `src_bits` to `dst_bits`. No-op when they match.
pub fn scale(buffer: &mut [f64], src_bits: u16, dst_bits: u16) {
    if src_bits == dst_bits {
        return;
    }
    let factor = scale_factor(src_bits, dst_bits);
    for sample in buffer.iter_mut() {
        *sample *= factor;
    }
}

/// Apply gain (when not unity) and then polarity inversion (when set).
pub fn apply_fx(buffer: &mut [f64], fx: Option<&TrackFx>) {
    let Some(fx) = fx else {
        return;
    };
    if fx.gain != 1.0 {
        for sample in buffer.iter_mut() {
            *sample *= fx.gain;
        }
    }
    if fx.invert {
        for sample in buffer.iter_mut() {
            *sample = -*sample;
        }
    }
}

/// Zero the whole accumulator, not just the last chunk's length.
pub fn reset(accumulator: &mut [f64]) {
    accumulator.fill(0.0);
}

/// Add each contribution element-wise into the front of `accumulator`.
///
/// The accumulator must have been [`reset`] for this round. Contributions
/// may differ in length; slots past a short contribution keep whatever the
/// longer ones add. Returns the length of the longest contribution, capped
/// at the accumulator's capacity.
pub fn sum_into<'a, I>(accumulator: &mut [f64], contributions: I) -> usize
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut mix_length = 0;
    for contribution in contributions {
        let len = contribution.len().min(accumulator.len());
        for (slot, sample) in accumulator[..len].iter_mut().zip(contribution) {
            *slot += *sample;
        }
        mix_length = mix_length.max(len);
    }
    mix_length
}

/// Divide every sample by `track_count`.
///
/// Callers pass the number of configured tracks, not the number that
/// contributed to this chunk.
pub fn attenuate(buffer: &mut [f64], track_count: usize) {
    if track_count <= 1 {
        return;
    }
    let divisor = track_count as f64;
    for sample in buffer.iter_mut() {
        *sample /= divisor;
    }
}
