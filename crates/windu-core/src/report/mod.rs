/// Report assembly: turns scan records into output lines.
///
/// The plain-text layout is the primary report; [`export`] renders the same
/// ordered records as JSON or CSV. Nothing here touches the console.
/// Writing a report to disk lives in [`persist`].
pub mod export;
pub mod persist;

pub use export::{to_csv, to_json};

use crate::config::ScanConfig;
use crate::model::size::format_size;
use crate::model::DirectoryRecord;
use crate::scanner::ScanOutcome;
use std::cmp::Reverse;
use thiserror::Error;

pub const REPORT_TITLE: &str = "---Disk Usage Report---";

const RULE: &str = "---------------------------------------------------------------------";

/// Width of the size column in the text report.
const SIZE_COLUMN: usize = 15;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to render JSON report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render CSV report: {0}")]
    Csv(#[from] csv::Error),
}

/// Output format of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Records ordered by descending size.
///
/// The sort is stable: equal sizes keep the order the traversal produced
/// them in, so the same input always yields the same output.
pub fn sorted(records: &[DirectoryRecord]) -> Vec<&DirectoryRecord> {
    let mut ordered: Vec<&DirectoryRecord> = records.iter().collect();
    ordered.sort_by_key(|record| Reverse(record.byte_size));
    ordered
}

/// The fixed header block echoing the run's configuration.
pub fn header(config: &ScanConfig) -> Vec<String> {
    let depth = match config.max_depth {
        Some(depth) => depth.to_string(),
        None => "Infinite".to_string(),
    };
    vec![
        REPORT_TITLE.to_string(),
        format!("Scan path: {}", config.root.display()),
        format!(
            "Size Threshold: {} ({} bytes)",
            format_size(config.min_size),
            config.min_size
        ),
        format!("Max Depth: {depth}"),
        RULE.to_string(),
        format!("{:<SIZE_COLUMN$} {}", "Size", "Path"),
        RULE.to_string(),
    ]
}

/// Render one record as a report row.
pub fn format_row(record: &DirectoryRecord) -> String {
    format!(
        "{:<SIZE_COLUMN$} {}",
        format_size(record.byte_size),
        record.path.display()
    )
}

/// Build the text report: header, then one row per record, largest first.
pub fn assemble(records: &[DirectoryRecord], config: &ScanConfig) -> Vec<String> {
    let ordered = sorted(records);
    let mut lines = header(config);
    lines.reserve(ordered.len());
    lines.extend(ordered.into_iter().map(format_row));
    lines
}

/// Render a finished scan in the requested format, one string per line.
pub fn render(
    format: ReportFormat,
    outcome: &ScanOutcome,
    config: &ScanConfig,
) -> Result<Vec<String>, ReportError> {
    let lines = match format {
        ReportFormat::Text => assemble(&outcome.records, config),
        ReportFormat::Json => split_lines(&to_json(outcome, config)?),
        ReportFormat::Csv => split_lines(&to_csv(&outcome.records)?),
    };
    Ok(lines)
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}
