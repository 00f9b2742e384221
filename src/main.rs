//! Command line entry point: discover reports, parse them in path order,
//! merge and write `hosts.csv` and `services.csv`.
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use nmap2csv::aggregate::{AggregateReport, Aggregator};
use nmap2csv::discovery::discover;
use nmap2csv::input::{Config, Opts};
use nmap2csv::output::{write_csv, OutputOptions, Tabular, HOSTS_CSV_FILENAME, SERVICES_CSV_FILENAME};
use nmap2csv::parser::parse_file;
use nmap2csv::{detail, output, warning};

#[cfg(not(tarpaulin_include))]
fn main() {
    env_logger::init();

    if let Err(e) = run() {
        warning!(format!("Error: {e:#}"));
        std::process::exit(1);
    }
}

#[cfg(not(tarpaulin_include))]
fn run() -> anyhow::Result<()> {
    let mut opts = Opts::read();
    let config = Config::read(opts.config_path.clone())?;
    opts.merge(&config);

    debug!("Main() `opts` arguments are {opts:?}");

    if !opts.quiet {
        print_opening(&opts);
    }

    let reports = discover(&opts.files, opts.recursive)?;
    if reports.is_empty() {
        warning!("No Nmap XML reports found.");
        return Ok(());
    }

    let progress = progress_bar(reports.len() as u64, &opts);
    let mut aggregator = Aggregator::new();
    let mut failed = 0_usize;

    for path in &reports {
        progress.suspend(|| {
            detail!(
                format!("Parsing Nmap XML file: {}", path.display()),
                opts.quiet,
                opts.accessible
            );
        });

        match parse_file(path) {
            Ok(rows) => aggregator.add(path, rows),
            Err(e) if opts.fail_fast => {
                progress.abandon();
                return Err(e).with_context(|| format!("Could not parse {}", path.display()));
            }
            Err(e) => {
                failed += 1;
                progress.suspend(|| {
                    warning!(format!("Skipping {}: {e}", path.display()));
                });
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let parsed = aggregator.len();
    let report = aggregator.finish();
    write_datasets(&report, &opts)?;

    detail!(
        format!(
            "CSV generation completed: {parsed} report(s) parsed, {failed} skipped, {} host(s), {} service row(s).",
            report.hosts.len(),
            report.services.len()
        ),
        opts.quiet,
        opts.accessible
    );

    Ok(())
}

fn write_datasets(report: &AggregateReport, opts: &Opts) -> anyhow::Result<()> {
    let dir = opts.output_dir();
    let options = opts.output_options();

    write_dataset(&dir, SERVICES_CSV_FILENAME, "service", &report.services, &options, opts)?;
    write_dataset(&dir, HOSTS_CSV_FILENAME, "host", &report.hosts, &options, opts)?;
    Ok(())
}

fn write_dataset<T: Tabular>(
    dir: &Path,
    file_name: &str,
    label: &str,
    rows: &[T],
    options: &OutputOptions,
    opts: &Opts,
) -> anyhow::Result<()> {
    let written = write_csv(dir, file_name, rows, options)
        .with_context(|| format!("Could not write {file_name} to {}", dir.display()))?;

    match written {
        Some(path) => output!(
            format!("Wrote {label} infos to: {}", path.display()),
            opts.quiet,
            opts.accessible
        ),
        None => warning!(
            format!("No {label} rows found, {file_name} was not written."),
            opts.quiet,
            opts.accessible
        ),
    }
    Ok(())
}

fn progress_bar(len: u64, opts: &Opts) -> ProgressBar {
    if opts.quiet || opts.accessible || len < 2 {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} reports")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    ProgressBar::new(len).with_style(style)
}

/// Prints the opening title.
fn print_opening(opts: &Opts) {
    debug!("Printing opening");
    let title = format!("nmap2csv {}", env!("CARGO_PKG_VERSION"));
    let tagline = "Nmap XML in, spreadsheets out.";

    if opts.accessible {
        println!("{title}\n{tagline}\n");
    } else {
        println!("{}\n{}\n", title.bold().green(), tagline.italic());
    }
}
