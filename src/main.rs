//! windu: report which directories use the most disk space.
//!
//! Thin binary entry point. The traversal and report logic live in the
//! `windu-core` crate; this file parses arguments, echoes the report to
//! stdout, and saves it when asked.

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Args, OutputFormat};
use tracing::{error, warn, Level};
use windu_core::platform::OsFileSystem;
use windu_core::report::{self, persist};
use windu_core::ScanErrorKind;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the report.
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = args.scan_config()?;
    config.validate(&OsFileSystem)?;

    // JSON and CSV documents own stdout; progress lines move to stderr.
    let status = |line: String| match args.format {
        OutputFormat::Text => println!("{line}"),
        OutputFormat::Json | OutputFormat::Csv => eprintln!("{line}"),
    };

    status(format!("Starting disk usage scan for: {}", config.root.display()));
    status(format!("Reporting folders larger than: {} GB", args.min_size_gb));
    if let Some(depth) = config.max_depth {
        status(format!("Scanning with a max depth of: {depth}"));
    }
    if let Some(output) = &args.output {
        status(format!("Results will be saved to: '{}'", output.display()));
        persist::clear_previous(output);
    }

    let outcome = windu_core::scan(&OsFileSystem, &config)?;

    status("---SCAN COMPLETE---".to_string());
    status("Results (sorted by size):".to_string());

    let lines = report::render(args.format.into(), &outcome, &config)
        .context("failed to render the report")?;
    for line in &lines {
        println!("{line}");
    }

    if let Some(output) = &args.output {
        match persist::append_lines(output, &lines) {
            Ok(()) => status(format!("Report saved to: {}", output.display())),
            Err(err) => error!("Could not save report to '{}': {err}", output.display()),
        }
    }

    for kind in [
        ScanErrorKind::AccessDenied,
        ScanErrorKind::NotFound,
        ScanErrorKind::PathTooLong,
        ScanErrorKind::Io,
        ScanErrorKind::CycleGuardTripped,
    ] {
        let count = outcome.issue_count(kind);
        if count > 0 {
            warn!("{count} issue(s) during scan: {}", kind.label());
        }
    }

    Ok(())
}
