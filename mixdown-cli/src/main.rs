//! # Mixdown
//!
//! A command-line mixer for time-aligned PCM WAV tracks.

use log::error;

mod cli;
mod logging;
mod runner;

fn main() {
    let args = cli::args::build_cli().get_matches();
    let quiet = args.get_flag("quiet")
        || args
            .subcommand()
            .is_some_and(|(_, sub_matches)| sub_matches.get_flag("quiet"));
    logging::init(quiet);

    let code = match runner::run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            1
        }
    };

    std::process::exit(code)
}
