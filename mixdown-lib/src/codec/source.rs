//! Symphonia-backed PCM track source.

use std::collections::VecDeque;
use std::fs::File;
use std::path::Path;

use log::{debug, warn};
use symphonia::core::codecs::{
    CodecType, Decoder, DecoderOptions, CODEC_TYPE_NULL, CODEC_TYPE_PCM_ALAW,
    CODEC_TYPE_PCM_F32BE, CODEC_TYPE_PCM_F32LE, CODEC_TYPE_PCM_F64BE, CODEC_TYPE_PCM_F64LE,
    CODEC_TYPE_PCM_MULAW, CODEC_TYPE_PCM_S16BE, CODEC_TYPE_PCM_S16LE, CODEC_TYPE_PCM_S24BE,
    CODEC_TYPE_PCM_S24LE, CODEC_TYPE_PCM_S32BE, CODEC_TYPE_PCM_S32LE, CODEC_TYPE_PCM_S8,
    CODEC_TYPE_PCM_U16BE, CODEC_TYPE_PCM_U16LE, CODEC_TYPE_PCM_U24BE, CODEC_TYPE_PCM_U24LE,
    CODEC_TYPE_PCM_U32BE, CODEC_TYPE_PCM_U32LE, CODEC_TYPE_PCM_U8,
};
use symphonia::core::errors::Error;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{MixError, MixResult};

use super::convert::append_interleaved;
use super::{ChunkSource, SampleEncoding, TrackInfo};

/// Classify a symphonia codec by sample encoding.
pub fn encoding_for_codec(codec: CodecType) -> SampleEncoding {
    match codec {
        CODEC_TYPE_PCM_S8 | CODEC_TYPE_PCM_S16LE | CODEC_TYPE_PCM_S16BE
        | CODEC_TYPE_PCM_S24LE | CODEC_TYPE_PCM_S24BE | CODEC_TYPE_PCM_S32LE
        | CODEC_TYPE_PCM_S32BE => SampleEncoding::SignedPcm,
        CODEC_TYPE_PCM_U8 | CODEC_TYPE_PCM_U16LE | CODEC_TYPE_PCM_U16BE
        | CODEC_TYPE_PCM_U24LE | CODEC_TYPE_PCM_U24BE | CODEC_TYPE_PCM_U32LE
        | CODEC_TYPE_PCM_U32BE => SampleEncoding::UnsignedPcm,
        CODEC_TYPE_PCM_F32LE | CODEC_TYPE_PCM_F32BE | CODEC_TYPE_PCM_F64LE
        | CODEC_TYPE_PCM_F64BE => SampleEncoding::IeeeFloat,
        CODEC_TYPE_PCM_ALAW => SampleEncoding::ALaw,
        CODEC_TYPE_PCM_MULAW => SampleEncoding::MuLaw,
        other => SampleEncoding::Other(
            symphonia::default::get_codecs()
                .get_codec(other)
                .map(|descriptor| descriptor.short_name)
                .unwrap_or("unknown codec"),
        ),
    }
}

/// A PCM track read from a container file through symphonia.
///
/// Decoded packets are queued until a chunk can be filled, so chunk
/// boundaries are independent of the container's packet size.
pub struct PcmFileSource {
    path: String,
    info: TrackInfo,
    format: Box<dyn FormatReader>,
    decoder: Option<Box<dyn Decoder>>,
    track_id: u32,
    pending: VecDeque<i32>,
    finished: bool,
}

impl PcmFileSource {
    /// Open and probe a file, reading its stream metadata.
    ///
    /// A decoder is only built for integer PCM tracks; other encodings are
    /// reported through [`TrackInfo::encoding`] and rejected when a session
    /// validates its inputs.
    ///
    /// # Errors
    /// Returns [`MixError::Io`] if the file cannot be opened and
    /// [`MixError::InvalidFile`] if it cannot be probed as an audio container.
    pub fn open(file_path: &str) -> MixResult<Self> {
        let file = File::open(file_path)?;
        Self::from_media_source(Box::new(file), file_path)
    }

    fn from_media_source(source: Box<dyn MediaSource>, file_path: &str) -> MixResult<Self> {
        let invalid = |reason: String| MixError::InvalidFile {
            path: file_path.to_string(),
            reason,
        };

        let mss = MediaSourceStream::new(source, Default::default());
        let mut hint = Hint::new();
        if let Some(extension) = Path::new(file_path)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();
        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|err| invalid(err.to_string()))?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| invalid("no audio tracks found".to_string()))?;
        let params = track.codec_params.clone();
        let track_id = track.id;

        let encoding = encoding_for_codec(params.codec);
        let sample_rate = params
            .sample_rate
            .ok_or_else(|| invalid("missing sample rate".to_string()))?;
        let channels = params
            .channels
            .map(|channels| channels.count() as u16)
            .ok_or_else(|| invalid("missing channel layout".to_string()))?;
        let bit_depth = params.bits_per_sample.unwrap_or(0) as u16;

        let decoder = if encoding.is_integer_pcm() {
            if bit_depth == 0 {
                return Err(invalid("missing bits per sample".to_string()));
            }
            let dec_opts: DecoderOptions = Default::default();
            let decoder = symphonia::default::get_codecs()
                .make(&params, &dec_opts)
                .map_err(|err| invalid(err.to_string()))?;
            Some(decoder)
        } else {
            None
        };

        let info = TrackInfo {
            encoding,
            bit_depth,
            sample_rate,
            channels,
            frames: params.n_frames,
        };
        debug!("opened {}: {:?}", file_path, info);

        Ok(Self {
            path: file_path.to_string(),
            info,
            format,
            decoder,
            track_id,
            pending: VecDeque::new(),
            finished: false,
        })
    }

    /// Path this source was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn decode_next_packet(&mut self) -> MixResult<()> {
        let decoder = match self.decoder.as_mut() {
            Some(decoder) => decoder,
            None => {
                return Err(MixError::Decode(format!(
                    "{}: no decoder for {}",
                    self.path, self.info.encoding
                )))
            }
        };

        let packet = match self.format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.finished = true;
                return Ok(());
            }
            Err(Error::ResetRequired) => {
                self.finished = true;
                return Ok(());
            }
            Err(err) => return Err(MixError::Decode(err.to_string())),
        };

        if packet.track_id() != self.track_id {
            return Ok(());
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if append_interleaved(&decoded, &mut self.pending).is_none() {
                    return Err(MixError::Decode(format!(
                        "{}: decoder produced floating-point samples",
                        self.path
                    )));
                }
            }
            Err(Error::DecodeError(err)) => {
                warn!("{}: skipping undecodable packet: {}", self.path, err);
            }
            Err(err) => return Err(MixError::Decode(err.to_string())),
        }

        Ok(())
    }
}

impl ChunkSource for PcmFileSource {
    fn info(&self) -> &TrackInfo {
        &self.info
    }

    fn decode_chunk(&mut self, out: &mut [i32]) -> MixResult<usize> {
        while self.pending.len() < out.len() && !self.finished {
            self.decode_next_packet()?;
        }

        let count = out.len().min(self.pending.len());
        for (slot, sample) in out.iter_mut().zip(self.pending.drain(..count)) {
            *slot = sample;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn test_file_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        std::env::temp_dir().join(format!("mixdown-source-{}-{}.wav", tag, nanos))
    }

    fn write_int_wav(path: &PathBuf, bits: u16, channels: u16, samples: &[i32]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 48_000,
            bits_per_sample: bits,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
        for &sample in samples {
            writer.write_sample(sample).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }

    #[test]
    fn reads_16bit_wav_in_chunks() {
        let path = test_file_path("s16");
        let samples: Vec<i32> = (0..2500).map(|i| (i % 200) - 100).collect();
        write_int_wav(&path, 16, 2, &samples);

        let mut source = PcmFileSource::open(path.to_str().unwrap()).expect("open");
        assert_eq!(source.info().encoding, SampleEncoding::SignedPcm);
        assert_eq!(source.info().bit_depth, 16);
        assert_eq!(source.info().sample_rate, 48_000);
        assert_eq!(source.info().channels, 2);

        let mut out = vec![0_i32; 1000];
        let mut collected = Vec::new();
        loop {
            let count = source.decode_chunk(&mut out).expect("decode");
            if count == 0 {
                break;
            }
            collected.extend_from_slice(&out[..count]);
        }
        assert_eq!(collected, samples);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn keeps_sign_of_24bit_samples() {
        let path = test_file_path("s24");
        let samples = vec![-8_388_608, -1000, 0, 1000, 8_388_607];
        write_int_wav(&path, 24, 1, &samples);

        let mut source = PcmFileSource::open(path.to_str().unwrap()).expect("open");
        assert_eq!(source.info().bit_depth, 24);
        let mut out = vec![0_i32; 16];
        let count = source.decode_chunk(&mut out).expect("decode");
        assert_eq!(&out[..count], samples.as_slice());
        assert_eq!(source.decode_chunk(&mut out).expect("decode"), 0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reports_float_encoding_without_decoding() {
        let path = test_file_path("f32");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
        for _ in 0..64 {
            writer.write_sample(0.25_f32).expect("write sample");
        }
        writer.finalize().expect("finalize wav");

        let source = PcmFileSource::open(path.to_str().unwrap()).expect("open");
        assert_eq!(source.info().encoding, SampleEncoding::IeeeFloat);
        assert!(!source.info().encoding.is_integer_pcm());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejects_non_audio_files() {
        let path = test_file_path("junk");
        std::fs::write(&path, b"definitely not a wav file").expect("write junk");
        let result = PcmFileSource::open(path.to_str().unwrap());
        assert!(matches!(result, Err(MixError::InvalidFile { .. })));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn classifies_codecs() {
        assert_eq!(
            encoding_for_codec(CODEC_TYPE_PCM_S24LE),
            SampleEncoding::SignedPcm
        );
        assert_eq!(encoding_for_codec(CODEC_TYPE_PCM_ALAW), SampleEncoding::ALaw);
        assert_eq!(encoding_for_codec(CODEC_TYPE_PCM_MULAW), SampleEncoding::MuLaw);
        assert_eq!(
            encoding_for_codec(CODEC_TYPE_PCM_F64LE),
            SampleEncoding::IeeeFloat
        );
    }
}
