//! Sweeps the priority fraction at a fixed load and reports averaged residence times.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use eyre::{eyre, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use prisim::logger;
use prisim::sweep::{run_sweep_with_progress, LoadLevel, SweepConfig, SweepResult};

/// Output format.
#[derive(strum::EnumString)]
#[strum(serialize_all = "lowercase")]
enum Format {
    Table,
    Json,
    Csv,
}

/// Runs repeated simulations across priority fractions from 0 to 1 and finds the fraction at
/// which both classes have the closest average residence times.
#[derive(Parser)]
#[clap(version, author)]
struct Opt {
    /// Predefined load: `high` (arrival rate 0.95) or `low` (arrival rate 0.5).
    #[clap(long, conflicts_with = "arrival-rate")]
    load: Option<LoadLevel>,

    /// Mean number of arrivals per time unit.
    #[clap(long)]
    arrival_rate: Option<f64>,

    /// Path to a JSON file with the sweep configuration. Command line options take precedence.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Distance between consecutive priority fractions.
    #[clap(long)]
    step: Option<f64>,

    /// Number of runs per priority fraction.
    #[clap(short, long)]
    replications: Option<usize>,

    /// Seed from which all random streams are derived.
    #[clap(short, long)]
    seed: Option<u64>,

    /// Arrival cap of each run.
    #[clap(long)]
    max_arrivals: Option<usize>,

    /// Output format: `table`, `json`, or `csv`.
    #[clap(short, long, default_value = "table")]
    format: Format,

    /// Do not display the progress bar.
    #[clap(long)]
    no_progress: bool,

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

impl Opt {
    /// Resolves the sweep configuration from the config file (if any) and the options.
    fn sweep_config(&self) -> eyre::Result<SweepConfig> {
        let arrival_rate = self
            .load
            .map(LoadLevel::arrival_rate)
            .or(self.arrival_rate);
        let mut config = match (&self.config, arrival_rate) {
            (Some(path), _) => {
                let file = File::open(path)
                    .wrap_err_with(|| format!("unable to open config: {}", path.display()))?;
                serde_json::from_reader(file).wrap_err("unable to parse sweep config")?
            }
            (None, Some(arrival_rate)) => SweepConfig::new(arrival_rate),
            (None, None) => {
                return Err(eyre!(
                    "one of --load, --arrival-rate, or --config is required"
                ))
            }
        };
        if let Some(arrival_rate) = arrival_rate {
            config.arrival_rate = arrival_rate;
        }
        if let Some(step) = self.step {
            config.step = step;
        }
        if let Some(replications) = self.replications {
            config.replications = replications;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(max_arrivals) = self.max_arrivals {
            config.max_arrivals = max_arrivals;
        }
        config.validate().wrap_err("invalid sweep config")?;
        Ok(config)
    }
}

/// A flat record of one sweep point.
#[derive(Serialize)]
struct Row {
    priority_fraction: f64,
    regular: Option<f64>,
    priority: Option<f64>,
    runs: usize,
}

fn rows(result: &SweepResult) -> impl Iterator<Item = Row> + '_ {
    result.points().map(|point| Row {
        priority_fraction: point.priority_fraction,
        regular: point.mean.regular,
        priority: point.mean.priority,
        runs: point.runs().len(),
    })
}

fn format_average(value: Option<f64>) -> String {
    value.map_or_else(|| String::from("-"), |v| format!("{:.4}", v))
}

fn write_table<W: Write>(mut writer: W, result: &SweepResult) -> io::Result<()> {
    writeln!(writer, "arrival rate: {}", result.arrival_rate)?;
    writeln!(writer, "{:>8} {:>10} {:>10}", "fraction", "regular", "priority")?;
    for row in rows(result) {
        writeln!(
            writer,
            "{:>8.2} {:>10} {:>10}",
            row.priority_fraction,
            format_average(row.regular),
            format_average(row.priority)
        )?;
    }
    match result.intersection() {
        Some(point) => writeln!(
            writer,
            "closest averages at fraction {:.2}: regular {} / priority {}",
            point.priority_fraction,
            format_average(point.mean.regular),
            format_average(point.mean.priority)
        ),
        None => writeln!(writer, "no fraction with both classes present"),
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    result: &'a SweepResult,
    intersection: Option<f64>,
}

fn write_output(format: &Format, result: &SweepResult) -> eyre::Result<()> {
    let stdout = io::stdout();
    let writer = stdout.lock();
    match format {
        Format::Table => write_table(writer, result)?,
        Format::Json => {
            let output = JsonOutput {
                result,
                intersection: result.intersection().map(|p| p.priority_fraction),
            };
            serde_json::to_writer_pretty(writer, &output)?;
            println!();
        }
        Format::Csv => {
            let mut writer = csv::Writer::from_writer(writer);
            for row in rows(result) {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();
    logger::set_up_logger(opt.verbose, opt.log_output.as_deref(), opt.no_stderr)?;
    let config = opt.sweep_config()?;
    let total = config.fractions()?.len() * config.replications;
    let pb = if opt.no_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(total as u64)
            .with_style(ProgressStyle::default_bar().template("{msg} {wide_bar} {pos}/{len}"))
    };
    pb.set_message(&format!("[lambda={}]", config.arrival_rate));
    let result = run_sweep_with_progress(&config, || pb.inc(1))?;
    pb.finish_and_clear();
    write_output(&opt.format, &result)
}
