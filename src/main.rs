use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use sheet_merge::config::{EmptyPolicy, MergeConfig};
use sheet_merge::matcher::similarity::SimilarityMetric;
use sheet_merge::model::{FileOutcome, OutcomeStatus};
use sheet_merge::normalize::WhitespaceMode;
use sheet_merge::pipeline::{self, MergeReport, MergeRequest};
use sheet_merge::{MergeError, Result};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.quiet)?;

    let config = cli.resolve_config()?;
    let request = MergeRequest {
        template: cli.template.clone(),
        mapping: cli.mapping.clone(),
        sources: cli.sources.clone(),
        output: cli.output.clone(),
    };

    let report = match pipeline::run(&request, &config) {
        Ok(report) => report,
        Err(MergeError::Unwritten { report, source }) => {
            print_summary(&report, false);
            write_summary_json(cli.summary_json.as_deref(), &report)?;
            return Err(*source);
        }
        Err(error) => return Err(error),
    };
    print_summary(&report, true);
    write_summary_json(cli.summary_json.as_deref(), &report)
}

fn write_summary_json(path: Option<&Path>, report: &MergeReport) -> Result<()> {
    if let Some(path) = path {
        let json = serde_json::to_string_pretty(&report.result.outcomes)?;
        fs::write(path, json)?;
    }
    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let default_level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| MergeError::Logging(err.to_string()))
}

fn print_summary(report: &MergeReport, written: bool) {
    for outcome in &report.result.outcomes {
        println!("{}", describe(outcome));
    }
    let summary = report.result.summary();
    let destination = if written {
        format!("written to {}", report.output.display())
    } else {
        format!("not written to {}", report.output.display())
    };
    println!(
        "{} accepted, {} rejected, {} rows {destination}",
        summary.accepted, summary.rejected, summary.rows
    );
}

fn describe(outcome: &FileOutcome) -> String {
    match &outcome.status {
        OutcomeStatus::Accepted { matched, rows, .. } => format!(
            "accepted  {} ({matched} columns, {rows} rows)",
            outcome.path.display()
        ),
        OutcomeStatus::Rejected { reason, .. } => {
            format!("rejected  {} ({reason})", outcome.path.display())
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Align spreadsheets to a template's columns and merge them into one file."
)]
struct Cli {
    /// Template file whose first row defines the output columns.
    #[arg(long, short = 't')]
    template: PathBuf,

    /// Optional two-column mapping table: template header | source header alias.
    #[arg(long, short = 'm')]
    mapping: Option<PathBuf>,

    /// Output path. Defaults to `<template>_filled.xlsx`.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// JSON configuration file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum number of resolved columns for a file to be merged.
    #[arg(long)]
    min_matches: Option<usize>,

    /// Minimum similarity (0 to 1) for a fuzzy header match.
    #[arg(long)]
    threshold: Option<f64>,

    /// Similarity metric used by fuzzy matching.
    #[arg(long, value_enum)]
    metric: Option<SimilarityMetric>,

    /// Rank fuzzy candidates by the metric alone, without the containment shortcut.
    #[arg(long)]
    no_containment: bool,

    /// Drop all whitespace from headers instead of collapsing it.
    #[arg(long)]
    remove_whitespace: bool,

    /// Scan this many leading rows of each source for its header row.
    #[arg(long)]
    probe_rows: Option<usize>,

    /// Value written into template columns a source does not provide.
    #[arg(long)]
    empty_value: Option<String>,

    /// Resolve and project source files in parallel.
    #[arg(long)]
    parallel: bool,

    /// Fail instead of writing a header-only file when nothing matches.
    #[arg(long)]
    abort_on_empty: bool,

    /// Office-suite executable used to convert legacy formats.
    #[arg(long)]
    converter: Option<String>,

    /// Write the per-file outcomes as JSON to this path.
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Source files to merge, processed in the given order.
    #[arg(required = true)]
    sources: Vec<PathBuf>,
}

impl Cli {
    fn resolve_config(&self) -> Result<MergeConfig> {
        let mut config = match &self.config {
            Some(path) => MergeConfig::load(path)?,
            None => MergeConfig::default(),
        };

        if let Some(min_matches) = self.min_matches {
            config.min_matches = min_matches;
        }
        if let Some(threshold) = self.threshold {
            config.fuzzy_threshold = threshold;
        }
        if let Some(metric) = self.metric {
            config.metric = metric;
        }
        if self.no_containment {
            config.fuzzy_containment = false;
        }
        if self.remove_whitespace {
            config.normalize.whitespace = WhitespaceMode::Remove;
        }
        if let Some(rows) = self.probe_rows {
            config.header_probe_rows = rows;
        }
        if let Some(value) = &self.empty_value {
            config.empty_value = value.clone();
        }
        if self.parallel {
            config.parallel = true;
        }
        if self.abort_on_empty {
            config.on_empty = EmptyPolicy::Abort;
        }
        if let Some(program) = &self.converter {
            config.legacy.program = program.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
