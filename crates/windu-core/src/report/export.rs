/// Machine-readable report formats.
///
/// Both formats carry exact byte counts and list directories in the same
/// order as the text report.
use super::{sorted, ReportError};
use crate::config::ScanConfig;
use crate::model::DirectoryRecord;
use crate::scanner::{ScanIssue, ScanStats};
use crate::ScanOutcome;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct JsonReport<'a> {
    root: &'a Path,
    min_size: u64,
    max_depth: Option<u32>,
    started_at: DateTime<Local>,
    duration_ms: u64,
    root_size: u64,
    stats: ScanStats,
    directories: Vec<&'a DirectoryRecord>,
    issues: &'a [ScanIssue],
}

/// Pretty-printed JSON document describing the whole run.
pub fn to_json(outcome: &ScanOutcome, config: &ScanConfig) -> Result<String, ReportError> {
    let report = JsonReport {
        root: &config.root,
        min_size: config.min_size,
        max_depth: config.max_depth,
        started_at: outcome.started_at,
        duration_ms: outcome.duration.as_millis() as u64,
        root_size: outcome.root_size,
        stats: outcome.stats,
        directories: sorted(&outcome.records),
        issues: &outcome.issues,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// CSV with a `path,byte_size,depth` header row.
pub fn to_csv(records: &[DirectoryRecord]) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in sorted(records) {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ReportError::Csv(err.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
