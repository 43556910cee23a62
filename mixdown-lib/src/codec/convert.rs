//! Conversion of decoded symphonia buffers into raw interleaved integers.

use std::collections::VecDeque;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::sample::Sample;

/// Sign-extend a 24-bit sample stored in the low bits of an `i32`.
pub fn sign_extend_24bit(sample: i32) -> i32 {
    sample << 8 >> 8
}

/// Re-centre an unsigned 8-bit sample around zero.
pub fn center_unsigned_8bit(sample: u8) -> i32 {
    sample as i32 - 128
}

/// Re-centre an unsigned 16-bit sample around zero.
pub fn center_unsigned_16bit(sample: u16) -> i32 {
    sample as i32 - 32_768
}

/// Re-centre an unsigned 24-bit sample around zero.
pub fn center_unsigned_24bit(sample: u32) -> i32 {
    (sample & 0x00ff_ffff) as i32 - (1 << 23)
}

/// Re-centre an unsigned 32-bit sample around zero.
pub fn center_unsigned_32bit(sample: u32) -> i32 {
    (sample as i64 - (1_i64 << 31)) as i32
}

/// Append every frame of a decoded packet to `out`, interleaved by channel.
///
/// Values keep the integer scale of the source bit depth. Returns the
/// number of samples appended, or `None` for floating-point buffers.
pub fn append_interleaved(decoded: &AudioBufferRef<'_>, out: &mut VecDeque<i32>) -> Option<usize> {
    let appended = match decoded {
        AudioBufferRef::U8(buf) => push_frames(&**buf, out, center_unsigned_8bit),
        AudioBufferRef::S8(buf) => push_frames(&**buf, out, |s| s as i32),
        AudioBufferRef::U16(buf) => push_frames(&**buf, out, center_unsigned_16bit),
        AudioBufferRef::S16(buf) => push_frames(&**buf, out, |s| s as i32),
        AudioBufferRef::U24(buf) => push_frames(&**buf, out, |s| center_unsigned_24bit(s.0)),
        AudioBufferRef::S24(buf) => push_frames(&**buf, out, |s| sign_extend_24bit(s.0)),
        AudioBufferRef::U32(buf) => push_frames(&**buf, out, center_unsigned_32bit),
        AudioBufferRef::S32(buf) => push_frames(&**buf, out, |s| s),
        _ => return None,
    };
    Some(appended)
}

fn push_frames<S, F>(buf: &AudioBuffer<S>, out: &mut VecDeque<i32>, convert: F) -> usize
where
    S: Sample,
    F: Fn(S) -> i32,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    out.reserve(frames * channels);
    for frame in 0..frames {
        for channel in 0..channels {
            out.push_back(convert(buf.chan(channel)[frame]));
        }
    }
    frames * channels
}
