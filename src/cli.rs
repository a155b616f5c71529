//! Command-line surface of windu.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use windu_core::config::ScanConfig;
use windu_core::platform::system_root;
use windu_core::report::ReportFormat;
use windu_core::{ScanError, ScanMode};

/// Report format for the console echo and the saved file.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table, largest directories first
    #[default]
    Text,
    /// One JSON document with exact sizes and skipped paths
    Json,
    /// `path,byte_size,depth` rows
    Csv,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Csv => ReportFormat::Csv,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "windu")]
#[command(about = "Report the directories that take up the most disk space")]
#[command(version)]
#[command(arg_required_else_help = true)]
#[command(after_help = "Example: windu -p C:\\ -m 0.1 -d 3 -o C:\\Temp\\MyDiskReport.txt\n  \
    (Scans C:\\, reports folders of 0.1 GB or more, up to 3 levels deep, saves the report)")]
pub struct Args {
    /// Starting directory to scan [default: the system drive root]
    #[arg(short = 'p', long = "path")]
    pub path: Option<PathBuf>,

    /// Minimum size in GB for a folder to be reported
    #[arg(short = 'm', long = "min-size", value_name = "GB", default_value_t = 1.0)]
    pub min_size_gb: f64,

    /// Maximum directory depth to scan and report, -1 for unbounded
    #[arg(
        short = 'd',
        long = "max-depth",
        value_name = "DEPTH",
        default_value_t = -1,
        allow_negative_numbers = true
    )]
    pub max_depth: i64,

    /// File to save the report to (replaced on every run)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(long = "format", value_name = "FORMAT", default_value = "text")]
    pub format: OutputFormat,

    /// Scan sibling directories on several threads
    #[arg(long = "parallel")]
    pub parallel: bool,

    /// Number of scan threads [default: number of CPUs]
    #[arg(long = "threads", value_name = "N", requires = "parallel")]
    pub threads: Option<usize>,

    /// Also refuse to enter a directory already visited through another path
    #[arg(long = "visited-guard")]
    pub visited_guard: bool,

    /// Log every scanned directory and skipped file
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Build the immutable scan configuration for this run.
    pub fn scan_config(&self) -> Result<ScanConfig, ScanError> {
        let root = self.path.clone().unwrap_or_else(system_root);
        let max_depth = ScanConfig::max_depth_from_sentinel(&root, self.max_depth)?;
        let mode = if self.parallel {
            ScanMode::Parallel {
                threads: self.threads.unwrap_or_else(num_cpus::get),
            }
        } else {
            ScanMode::Sequential
        };

        ScanConfig::new(root)
            .with_max_depth(max_depth)
            .with_mode(mode)
            .with_visited_guard(self.visited_guard)
            .with_min_size_gb(self.min_size_gb)
    }
}
