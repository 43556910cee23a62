//! Turn parsed arguments into a mix request.

use std::fmt;

use clap::ArgMatches;
use mixdown_lib::audio::BitDepth;
use mixdown_lib::dsp::gain::parse_gain;
use mixdown_lib::plan::{MixPlan, PlanTrack};

const STDOUT_PATH: &str = "-";

/// Where the mixed stream goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(String),
    Discard,
}

/// Everything `runner` needs to perform one mix.
#[derive(Debug, Clone, PartialEq)]
pub struct MixRequest {
    pub plan: MixPlan,
    pub output: Output,
    pub stats_json: bool,
}

/// An argument combination that cannot be mixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageError(pub String);

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UsageError {}

fn usage(message: impl Into<String>) -> UsageError {
    UsageError(message.into())
}

fn indexed_values(args: &ArgMatches, id: &str) -> Vec<(usize, String)> {
    match (args.indices_of(id), args.get_many::<String>(id)) {
        (Some(indices), Some(values)) => indices.zip(values.cloned()).collect(),
        _ => Vec::new(),
    }
}

/// Attach each `--gain`/`--invert` to the first input that follows it.
///
/// Arguments are `(position, value)` pairs in command-line order.
pub fn assign_track_fx(
    inputs: &[(usize, String)],
    gains: &[(usize, String)],
    inverts: &[usize],
) -> Result<Vec<PlanTrack>, UsageError> {
    let mut tracks: Vec<PlanTrack> = inputs
        .iter()
        .map(|(_, path)| PlanTrack::new(path.clone()))
        .collect();
    let mut has_gain = vec![false; tracks.len()];

    let next_input = |position: usize| inputs.iter().position(|(index, _)| *index > position);

    for (position, raw) in gains {
        let Some(target) = next_input(*position) else {
            return Err(usage(format!("--gain {} is not followed by an input", raw)));
        };
        if has_gain[target] {
            return Err(usage(format!(
                "input \"{}\" was given more than one gain",
                tracks[target].path
            )));
        }
        let gain = parse_gain(raw)
            .ok_or_else(|| usage(format!("invalid gain \"{}\"", raw)))?;
        tracks[target].fx.gain = gain;
        has_gain[target] = true;
    }

    for position in inverts {
        let Some(target) = next_input(*position) else {
            return Err(usage("--invert is not followed by an input"));
        };
        if tracks[target].fx.invert {
            return Err(usage(format!(
                "input \"{}\" was inverted more than once",
                tracks[target].path
            )));
        }
        tracks[target].fx.invert = true;
    }

    Ok(tracks)
}

fn resolve_output(args: &ArgMatches, nowrite: bool) -> Result<Output, UsageError> {
    let output = args.get_one::<String>("output");
    match (nowrite, output) {
        (true, Some(_)) => Err(usage("--nowrite cannot be combined with --output")),
        (true, None) => Ok(Output::Discard),
        (false, None) => Ok(Output::Stdout),
        (false, Some(path)) if path == STDOUT_PATH => Ok(Output::Stdout),
        (false, Some(path)) => Ok(Output::File(path.clone())),
    }
}

/// Build a request from the top-level matches.
///
/// A plan file supplies tracks and defaults; flags given on the command line
/// override the plan's options.
pub fn request_from_matches(args: &ArgMatches) -> Result<MixRequest, UsageError> {
    let nowrite = args.get_flag("nowrite");
    let nostats = args.get_flag("nostats");
    if nowrite && nostats {
        return Err(usage("--nowrite with --nostats leaves nothing to do"));
    }
    let output = resolve_output(args, nowrite)?;

    let mut plan = match args.get_one::<String>("plan") {
        Some(path) => MixPlan::from_path(path)
            .map_err(|err| usage(format!("plan \"{}\": {}", path, err)))?,
        None => {
            let inputs = indexed_values(args, "input");
            let gains = indexed_values(args, "gain");
            let inverts: Vec<usize> = args
                .indices_of("invert")
                .map(|indices| indices.collect())
                .unwrap_or_default();
            MixPlan {
                tracks: assign_track_fx(&inputs, &gains, &inverts)?,
                ..MixPlan::default()
            }
        }
    };
    if plan.tracks.is_empty() {
        return Err(usage("no input tracks given"));
    }

    if let Some(bits) = args.get_one::<String>("bits") {
        let bits: u16 = bits
            .parse()
            .map_err(|_| usage(format!("invalid bit depth \"{}\"", bits)))?;
        plan.bits = BitDepth::try_from(bits).map_err(|err| usage(err.to_string()))?;
    }
    if args.get_flag("attenuate") {
        plan.attenuate = true;
    }
    if let Some(buffer) = args.get_one::<u32>("buffer") {
        plan.buffer = *buffer as usize;
    }
    if nostats || output == Output::Stdout {
        plan.stats = false;
    }

    Ok(MixRequest {
        plan,
        output,
        stats_json: args.get_flag("stats-json"),
    })
}
