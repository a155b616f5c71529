/// Scanner module: the traversal engine.
///
/// Provides one traversal algorithm (post-order depth-first sizing) with
/// two schedulers:
/// - **Sequential:** plain recursion on the calling thread ([`traversal`]).
/// - **Parallel:** rayon fork-join over sibling subdirectories ([`parallel`]).
///
/// Both produce the same records in the same order. [`scan`] validates the
/// root, runs the configured scheduler, and packages the results.
pub mod parallel;
pub mod progress;
pub mod traversal;

pub use progress::{ScanIssue, ScanStats};
pub use traversal::Traversal;

use crate::config::{ScanConfig, ScanMode};
use crate::error::{ScanError, ScanErrorKind};
use crate::model::size::{format_count, format_size};
use crate::model::DirectoryRecord;
use crate::platform::FileSystem;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Stack reserved for the scanner thread and every parallel scan worker.
///
/// The traversal recurses once per directory level, and a legal path can
/// nest many thousands of levels (about 16k on Windows with long paths).
pub(crate) const SCAN_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Everything a finished scan produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    /// Cumulative size of the root, whether or not it was reported.
    pub root_size: u64,
    /// Qualifying directories in traversal (post-) order. Sort with
    /// [`report::sorted`](crate::report::sorted) for display.
    pub records: Vec<DirectoryRecord>,
    /// Every skip and error, in traversal order.
    pub issues: Vec<ScanIssue>,
    pub stats: ScanStats,
    pub started_at: DateTime<Local>,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl ScanOutcome {
    /// Number of issues of the given kind.
    pub fn issue_count(&self, kind: ScanErrorKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Scan `config.root` through `fs`.
///
/// The only error returned is [`ScanError::ConfigurationInvalid`] when the
/// root is missing or not a directory; everything met during traversal is
/// recorded in [`ScanOutcome::issues`] instead.
pub fn scan<F: FileSystem + ?Sized>(
    fs: &F,
    config: &ScanConfig,
) -> Result<ScanOutcome, ScanError> {
    config.validate(fs)?;

    let started_at = Local::now();
    let start = Instant::now();
    info!("Starting scan of {}", config.root.display());

    let traverse = || match config.mode {
        ScanMode::Sequential => {
            let mut traversal = Traversal::new(fs, config);
            let root_size = traversal.compute_size(&config.root, 0);
            let (records, issues, stats) = traversal.finish();
            (root_size, records, issues, stats)
        }
        ScanMode::Parallel { threads } => {
            info!("Using {threads} scan threads");
            let branch = parallel::scan_parallel(fs, config, threads);
            (branch.size, branch.records, branch.issues, branch.stats)
        }
    };
    let (root_size, records, issues, stats) = on_scanner_thread(traverse);

    let duration = start.elapsed();
    info!(
        "Scan complete: {} in {} directories, {} files, {} issues, {:?}",
        format_size(root_size),
        format_count(stats.dirs_visited),
        format_count(stats.files_counted),
        issues.len(),
        duration
    );

    Ok(ScanOutcome {
        root_size,
        records,
        issues,
        stats,
        started_at,
        duration,
    })
}

/// Run `work` on a named thread with [`SCAN_STACK_SIZE`] of stack, or on
/// the calling thread if that thread cannot be spawned.
fn on_scanner_thread<T, W>(work: W) -> T
where
    T: Send + 'static,
    W: Fn() -> T + Sync,
{
    thread::scope(|scope| {
        let spawned = thread::Builder::new()
            .name("windu-scanner".into())
            .stack_size(SCAN_STACK_SIZE)
            .spawn_scoped(scope, || work());
        match spawned {
            Ok(handle) => match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            },
            Err(err) => {
                warn!("Could not spawn scanner thread ({err}); scanning on the caller's stack");
                work()
            }
        }
    })
}
