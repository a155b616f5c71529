/// Scan bookkeeping: the skips and errors met along the way, and running
/// counters for the end-of-run summary.
///
/// Every degraded node is both logged through `tracing` at the point it is
/// met and kept as a [`ScanIssue`] so callers and tests can inspect what
/// the report does not cover.
use crate::error::{ScanError, ScanErrorKind};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One skipped or failed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub kind: ScanErrorKind,
    pub message: String,
}

impl From<&ScanError> for ScanIssue {
    fn from(err: &ScanError) -> Self {
        Self {
            path: err.path().to_path_buf(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Running totals for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Directories entered (after the depth and reparse checks).
    pub dirs_visited: u64,
    /// Files whose length was read successfully.
    pub files_counted: u64,
}

impl ScanStats {
    pub fn merge(&mut self, other: ScanStats) {
        self.dirs_visited += other.dirs_visited;
        self.files_counted += other.files_counted;
    }
}

/// Log `err` at a level matching its severity and keep it.
///
/// Individual file failures are routine on a system drive and only show at
/// debug level; directory-level failures are warnings.
pub(crate) fn record_issue(issues: &mut Vec<ScanIssue>, err: ScanError, file_level: bool) {
    match err.kind() {
        ScanErrorKind::CycleGuardTripped => info!("{err}"),
        _ if file_level => debug!("Skipping file: {err}"),
        _ => warn!("{err}"),
    }
    issues.push(ScanIssue::from(&err));
}
