//! `probe` subcommand: report track metadata without mixing.

use log::error;
use mixdown_lib::codec::{ChunkSource, PcmFileSource, TrackInfo};
use mixdown_lib::mix::validate_tracks;

fn describe(path: &str, info: &TrackInfo) -> String {
    let frames = match info.frames {
        Some(frames) => frames.to_string(),
        None => "unknown".to_string(),
    };
    format!(
        "{} encoding={} bits_per_sample={} sample_rate={} channels={} frames={}",
        path, info.encoding, info.bit_depth, info.sample_rate, info.channels, frames
    )
}

/// Print each file's metadata, then whether the set can be mixed together.
///
/// Returns the process exit code: `0` when every file opens and the set
/// validates, `1` otherwise.
pub fn run_probe(paths: &[String]) -> i32 {
    let mut infos = Vec::with_capacity(paths.len());
    for path in paths {
        match PcmFileSource::open(path) {
            Ok(source) => {
                println!("{}", describe(path, source.info()));
                infos.push(source.info().clone());
            }
            Err(err) => {
                error!("{}: {}", path, err.to_string().to_lowercase());
                return 1;
            }
        }
    }

    match validate_tracks(&infos) {
        Ok(format) => {
            println!(
                "Probed {} track(s): mixable at {} Hz, {} channel(s)",
                infos.len(),
                format.sample_rate,
                format.channels
            );
            0
        }
        Err(err) => {
            println!("Probed {} track(s): not mixable: {}", infos.len(), err);
            1
        }
    }
}
