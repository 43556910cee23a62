//! Sample-format primitives shared by the mixer and its codecs.

mod bit_depth;

pub use bit_depth::BitDepth;
