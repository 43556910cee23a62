//! Error types for mixing sessions and their codec adapters.

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::codec::SampleEncoding;

/// Stream property that must agree across every track in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchedProperty {
    SampleRate,
    ChannelCount,
}

impl Display for MismatchedProperty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SampleRate => write!(f, "sample rate"),
            Self::ChannelCount => write!(f, "channel count"),
        }
    }
}

/// Errors surfaced by session validation, decoding and encoding.
///
/// Every variant is terminal for the session that produced it.
#[derive(Debug, Error)]
pub enum MixError {
    #[error("no input tracks given")]
    NoTracks,

    #[error("invalid file {path}: {reason}")]
    InvalidFile { path: String, reason: String },

    #[error("track {index}: {encoding} is not currently supported")]
    UnsupportedEncoding {
        index: usize,
        encoding: SampleEncoding,
    },

    #[error("track {index}: {bits}-bit samples are not currently supported")]
    UnsupportedBitDepth { index: usize, bits: u16 },

    #[error("track {index}: {property} mismatch (expected {expected}, found {found})")]
    FormatMismatch {
        index: usize,
        property: MismatchedProperty,
        expected: u32,
        found: u32,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid mix plan: {0}")]
    Plan(#[from] serde_json::Error),
}

impl From<hound::Error> for MixError {
    fn from(value: hound::Error) -> Self {
        match value {
            hound::Error::IoError(err) => Self::Io(err),
            other => Self::Encode(other.to_string()),
        }
    }
}

/// Result alias used across the library.
pub type MixResult<T> = Result<T, MixError>;
