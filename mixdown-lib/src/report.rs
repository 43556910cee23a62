//! Human- and machine-readable reports of a finished mix.

use std::fmt::Write;

use serde::Serialize;

use crate::error::MixResult;
use crate::mix::{MixSummary, TrackStats};

#[derive(Serialize)]
struct LabelledStats<'a> {
    label: &'a str,
    #[serde(flatten)]
    stats: &'a TrackStats,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    summary: &'a MixSummary,
    tracks: Vec<LabelledStats<'a>>,
}

fn format_db(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}", value)
    } else {
        "-inf".to_string()
    }
}

fn push_block(out: &mut String, title: &str, stats: &TrackStats) {
    let _ = writeln!(out, "----- Stats for {} -----", title);
    let _ = writeln!(out, "{}dB RMS.", format_db(stats.rms_db));
    let _ = writeln!(out, "{}dB peak.", format_db(stats.peak_db));
    let _ = writeln!(out, "{} clipped samples.", stats.clipped_count);
    let _ = writeln!(out, "{} total samples.", stats.sample_count);
}

/// Render per-track and mix statistics as plain text.
///
/// `labels` name the tracks in session order. Returns an empty string when
/// the session did not collect statistics.
pub fn render_text(summary: &MixSummary, labels: &[String]) -> String {
    let mut out = String::new();
    let Some(stats) = summary.stats.as_ref() else {
        return out;
    };
    for (index, track) in stats.tracks.iter().enumerate() {
        let title = match labels.get(index) {
            Some(label) => format!("\"{}\"", label),
            None => format!("track {}", index),
        };
        push_block(&mut out, &title, track);
    }
    push_block(&mut out, "mix", &stats.mix);
    out
}

/// Render the summary, with per-track statistics labelled, as pretty JSON.
///
/// Silent streams have dB figures of negative infinity, which JSON cannot
/// represent; they are emitted as `null`.
pub fn render_json(summary: &MixSummary, labels: &[String]) -> MixResult<String> {
    let tracks: Vec<LabelledStats<'_>> = summary
        .stats
        .as_ref()
        .map(|stats| {
            stats
                .tracks
                .iter()
                .enumerate()
                .map(|(index, stats)| LabelledStats {
                    label: labels.get(index).map(String::as_str).unwrap_or(""),
                    stats,
                })
                .collect()
        })
        .unwrap_or_default();
    let report = JsonReport { summary, tracks };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BitDepth;
    use crate::mix::{LevelStats, SessionFormat};

    fn summary(with_stats: bool) -> MixSummary {
        let mut stats = LevelStats::new(2, BitDepth::Sixteen);
        stats.tracks[0].accumulate(&[32_767.0, 40_000.0], BitDepth::Sixteen);
        stats.mix.accumulate(&[16_000.0, 0.0], BitDepth::Sixteen);
        MixSummary {
            format: SessionFormat {
                sample_rate: 48_000,
                channels: 1,
            },
            bit_depth: BitDepth::Sixteen,
            chunks: 1,
            samples: 2,
            stats: with_stats.then_some(stats),
        }
    }

    #[test]
    fn text_report_has_a_block_per_track_and_the_mix() {
        let labels = vec!["a.wav".to_string(), "b.wav".to_string()];
        let text = render_text(&summary(true), &labels);
        assert!(text.contains("----- Stats for \"a.wav\" -----"));
        assert!(text.contains("----- Stats for \"b.wav\" -----"));
        assert!(text.contains("----- Stats for mix -----"));
        assert!(text.contains("1 clipped samples."));
        assert!(text.contains("-infdB RMS."));
        assert_eq!(text.matches("total samples.").count(), 3);
    }

    #[test]
    fn text_report_is_empty_without_stats() {
        assert!(render_text(&summary(false), &[]).is_empty());
    }

    #[test]
    fn json_report_labels_tracks() {
        let labels = vec!["a.wav".to_string(), "b.wav".to_string()];
        let json = render_json(&summary(true), &labels).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["tracks"][0]["label"], "a.wav");
        assert_eq!(value["tracks"][0]["clipped_count"], 1);
        assert_eq!(value["tracks"][1]["peak_db"], serde_json::Value::Null);
        assert_eq!(value["samples"], 2);
        assert_eq!(value["stats"]["mix"]["sample_count"], 2);
    }
}
