//! Runs a single two-class priority queue simulation.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::path::PathBuf;

use clap::Parser;
use eyre::WrapErr;

use prisim::{logger, RandomVariates, RunReport, Simulation, SimulationConfig};

/// Simulates a single-server queue with Priority and Regular customers, and reports the
/// average residence time of each class.
#[derive(Parser)]
#[clap(version, author)]
struct Opt {
    /// Mean number of arrivals per time unit; the mean service time is one time unit.
    #[clap(long)]
    arrival_rate: f64,

    /// Probability that an arriving customer is of the Priority class.
    #[clap(long)]
    priority_fraction: f64,

    /// Seed to use for random number generator.
    #[clap(short, long)]
    seed: Option<u64>,

    /// Stop after this many arrivals.
    #[clap(long, default_value = "50000")]
    max_arrivals: usize,

    /// Print the full report in JSON format.
    #[clap(long)]
    json: bool,

    /// Verbosity.
    #[clap(short, long, parse(from_occurrences))]
    verbose: u64,

    /// Store the logs this file.
    #[clap(long)]
    log_output: Option<PathBuf>,

    /// Do not log to the stderr.
    #[clap(long)]
    no_stderr: bool,
}

fn print_report(report: &RunReport) {
    let (regular, priority) = report.residence.to_pair();
    println!("regular\t{:.6}", regular);
    println!("priority\t{:.6}", priority);
    if report.residence.priority.is_none() {
        log::info!("No Priority customer departed; reported as 0");
    }
    if report.residence.regular.is_none() {
        log::info!("No Regular customer departed; reported as 0");
    }
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();
    logger::set_up_logger(opt.verbose, opt.log_output.as_deref(), opt.no_stderr)?;
    let config = SimulationConfig::new(opt.arrival_rate, opt.priority_fraction)
        .and_then(|c| c.with_max_arrivals(opt.max_arrivals))
        .wrap_err("invalid simulation parameters")?;
    let variates = match opt.seed {
        Some(seed) => RandomVariates::seeded(seed),
        None => RandomVariates::from_entropy(),
    };
    let report = Simulation::new(config, variates)?.run();
    if opt.json {
        serde_json::to_writer_pretty(std::io::stdout(), &report)
            .wrap_err("unable to write report")?;
        println!();
    } else {
        print_report(&report);
    }
    Ok(())
}
