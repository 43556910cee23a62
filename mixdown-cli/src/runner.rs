use std::io::{self, BufWriter, Write};

use clap::ArgMatches;
use log::{error, info};
use mixdown_lib::codec::{NullSink, WavFileSink, WavStreamSink};
use mixdown_lib::mix::{MixSession, MixSummary};
use mixdown_lib::plan::MixPlan;
use mixdown_lib::report;
use mixdown_lib::MixResult;

use crate::cli::options::{self, MixRequest, Output};
use crate::cli::probe;

/// Exit code for argument combinations that cannot be mixed.
pub const USAGE_EXIT_CODE: i32 = 2;

pub fn run(args: &ArgMatches) -> MixResult<i32> {
    match args.subcommand() {
        Some(("probe", sub_matches)) => {
            let paths: Vec<String> = sub_matches
                .get_many::<String>("INPUT")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            return Ok(probe::run_probe(&paths));
        }
        Some(("create", sub_matches)) => {
            if let Some(("plan-json", _)) = sub_matches.subcommand() {
                println!("{}", MixPlan::example().to_json()?);
                return Ok(0);
            }
            return Ok(USAGE_EXIT_CODE);
        }
        _ => {}
    }

    let request = match options::request_from_matches(args) {
        Ok(request) => request,
        Err(err) => {
            error!("{}", err);
            return Ok(USAGE_EXIT_CODE);
        }
    };

    let summary = mix(&request)?;
    if summary.stats.is_some() {
        print_report(&summary, &request)?;
    }
    Ok(0)
}

fn mix(request: &MixRequest) -> MixResult<MixSummary> {
    let plan = &request.plan;
    info!("Mixing {} track(s)", plan.tracks.len());

    let inputs = plan.open_inputs()?;
    let session = MixSession::new(inputs, plan.settings())?;
    let spec = session.output_spec();

    match &request.output {
        Output::Discard => session.run(&mut NullSink),
        Output::File(path) => {
            let mut sink = WavFileSink::create(path, spec)?;
            let summary = session.run(&mut sink)?;
            info!("Wrote mix to {}", path);
            Ok(summary)
        }
        Output::Stdout => {
            let stdout = io::stdout();
            let mut sink = WavStreamSink::new(BufWriter::new(stdout.lock()), spec);
            session.run(&mut sink)
        }
    }
}

fn print_report(summary: &MixSummary, request: &MixRequest) -> MixResult<()> {
    let labels = request.plan.labels();
    let rendered = if request.stats_json {
        report::render_json(summary, &labels)?
    } else {
        report::render_text(summary, &labels)
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", rendered.trim_end())?;
    out.flush()?;
    Ok(())
}
