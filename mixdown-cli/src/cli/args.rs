//! CLI argument definitions for `mixdown-cli`.

use clap::{value_parser, Arg, ArgAction, Command};
use mixdown_lib::constants::MAX_BUFFER_CAPACITY;

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("mixdown")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Mix time-aligned PCM WAV tracks into one")
        .arg_required_else_help(true)
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Input WAV file (repeat for each track)"),
        )
        .arg(
            Arg::new("gain")
                .long("gain")
                .short('g')
                .value_name("GAIN")
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .help("Gain for the next input, linear (0.5) or in dB (-6dB)"),
        )
        .arg(
            Arg::new("invert")
                .long("invert")
                .action(ArgAction::Append)
                .num_args(0)
                .default_missing_value("true")
                .help("Invert the polarity of the next input"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("FILE")
                .allow_hyphen_values(true)
                .help("Destination WAV file of the mix, or - for standard output"),
        )
        .arg(
            Arg::new("bits")
                .long("bits")
                .short('b')
                .value_name("BITS")
                .value_parser(["16", "24", "32"])
                .help("Bit depth of the mix [default: 24]"),
        )
        .arg(
            Arg::new("attenuate")
                .long("attenuate")
                .short('a')
                .action(ArgAction::SetTrue)
                .help("Attenuate linearly to prevent clipping, dividing by the number of tracks"),
        )
        .arg(
            Arg::new("nowrite")
                .long("nowrite")
                .action(ArgAction::SetTrue)
                .help("Do not write the mix anywhere"),
        )
        .arg(
            Arg::new("nostats")
                .long("nostats")
                .action(ArgAction::SetTrue)
                .help("Do not collect level statistics"),
        )
        .arg(
            Arg::new("buffer")
                .long("buffer")
                .value_name("SAMPLES")
                .value_parser(value_parser!(u32).range(0..=MAX_BUFFER_CAPACITY as i64))
                .help("Number of samples to buffer per track [default: 8000]"),
        )
        .arg(
            Arg::new("stats-json")
                .long("stats-json")
                .action(ArgAction::SetTrue)
                .conflicts_with("nostats")
                .help("Print statistics as JSON"),
        )
        .arg(
            Arg::new("plan")
                .long("plan")
                .value_name("PATH")
                .conflicts_with_all(["input", "gain", "invert"])
                .help("Path to a JSON mix plan listing tracks and options"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Suppress all log output"),
        )
        .subcommand(
            Command::new("probe")
                .about("Print track metadata and check the tracks can be mixed")
                .arg(
                    Arg::new("INPUT")
                        .help("Input files")
                        .required(true)
                        .num_args(1..)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("create")
                .about("Emit default JSON payloads")
                .subcommand_required(true)
                .subcommand(
                    Command::new("plan-json").about("Print an example mix plan JSON payload"),
                ),
        )
}
