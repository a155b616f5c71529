/// Sequential post-order traversal: the reference engine.
///
/// Each directory is visited exactly once, depth-first. Its size is known
/// only after every child call has returned, so records are produced as the
/// recursion unwinds (children before parents).
///
/// Failure policy: nothing raised while reading a single directory ever
/// escapes the call for that directory. Denied or failed listings degrade
/// the directory to whatever could be measured; reparse points, depth
/// overruns and over-long paths contribute exactly 0.
use super::progress::{record_issue, ScanIssue, ScanStats};
use crate::config::ScanConfig;
use crate::error::{ScanError, ScanErrorKind};
use crate::model::DirectoryRecord;
use crate::platform::{DirId, FileSystem};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Decide whether `path` may be entered at `depth`.
///
/// Applies the depth bound, then the reparse-point check, then (when
/// enabled) the visited guard through `first_visit`.
pub(crate) fn should_enter<F: FileSystem + ?Sized>(
    fs: &F,
    config: &ScanConfig,
    path: &Path,
    depth: u32,
    issues: &mut Vec<ScanIssue>,
    first_visit: impl FnOnce(DirId) -> bool,
) -> bool {
    if !config.within_depth(depth) {
        return false;
    }

    match fs.is_reparse_point(path) {
        Ok(false) => {}
        Ok(true) => {
            let err = ScanError::CycleGuardTripped {
                path: path.to_path_buf(),
            };
            record_issue(issues, err, false);
            return false;
        }
        Err(err) => {
            record_issue(issues, err, false);
            return false;
        }
    }

    if config.visited_guard {
        if let Some(id) = fs.identity(path) {
            if !first_visit(id) {
                debug!("Already visited {} via another path", path.display());
                let err = ScanError::CycleGuardTripped {
                    path: path.to_path_buf(),
                };
                record_issue(issues, err, false);
                return false;
            }
        }
    }

    true
}

/// Errors that void the whole directory rather than one listing.
fn aborts_directory(err: &ScanError) -> bool {
    err.kind() == ScanErrorKind::PathTooLong
}

/// Measure the immediate files of `dir` and list its subdirectories.
///
/// A failed file listing counts as no files and a failed subdirectory
/// listing as no subdirectories; both are recorded. Only an error that
/// [`aborts_directory`] is returned, in which case the caller treats the
/// whole directory as size 0.
pub(crate) fn read_directory<F: FileSystem + ?Sized>(
    fs: &F,
    dir: &Path,
    issues: &mut Vec<ScanIssue>,
    stats: &mut ScanStats,
) -> Result<(u64, Vec<PathBuf>), ScanError> {
    let mut files_total: u64 = 0;

    match fs.read_files(dir) {
        Ok(files) => {
            for file in files {
                match file.len {
                    Ok(len) => {
                        files_total = files_total.saturating_add(len);
                        stats.files_counted += 1;
                    }
                    Err(err) => record_issue(issues, err, true),
                }
            }
        }
        Err(err) if aborts_directory(&err) => return Err(err),
        Err(err) => record_issue(issues, err, false),
    }

    let subdirs = match fs.list_subdirectories(dir) {
        Ok(subdirs) => subdirs,
        Err(err) if aborts_directory(&err) => return Err(err),
        Err(err) => {
            record_issue(issues, err, false);
            Vec::new()
        }
    };

    Ok((files_total, subdirs))
}

/// Single-threaded traversal state.
///
/// Owns the result accumulator for the duration of one scan; each
/// recursive call appends through `&mut self`.
pub struct Traversal<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    config: &'a ScanConfig,
    records: Vec<DirectoryRecord>,
    issues: Vec<ScanIssue>,
    stats: ScanStats,
    visited: HashSet<DirId>,
}

impl<'a, F: FileSystem + ?Sized> Traversal<'a, F> {
    pub fn new(fs: &'a F, config: &'a ScanConfig) -> Self {
        Self {
            fs,
            config,
            records: Vec::new(),
            issues: Vec::new(),
            stats: ScanStats::default(),
            visited: HashSet::new(),
        }
    }

    /// Cumulative apparent size of the subtree at `path`, visited at `depth`.
    ///
    /// Appends a record for `path` when the size meets the threshold. The
    /// size is returned whether or not a record was produced.
    pub fn compute_size(&mut self, path: &Path, depth: u32) -> u64 {
        let visited = &mut self.visited;
        if !should_enter(self.fs, self.config, path, depth, &mut self.issues, |id| {
            visited.insert(id)
        }) {
            return 0;
        }

        self.stats.dirs_visited += 1;
        debug!("Scanning {} (depth {depth})", path.display());

        let (mut total, subdirs) =
            match read_directory(self.fs, path, &mut self.issues, &mut self.stats) {
                Ok(contents) => contents,
                Err(err) => {
                    record_issue(&mut self.issues, err, false);
                    return 0;
                }
            };

        for subdir in subdirs {
            total = total.saturating_add(self.compute_size(&subdir, depth + 1));
        }

        if total >= self.config.min_size && self.config.within_depth(depth) {
            self.records
                .push(DirectoryRecord::new(path.to_path_buf(), total, depth));
        }

        total
    }

    /// Hand the accumulated results over to the caller.
    pub fn finish(self) -> (Vec<DirectoryRecord>, Vec<ScanIssue>, ScanStats) {
        (self.records, self.issues, self.stats)
    }
}
