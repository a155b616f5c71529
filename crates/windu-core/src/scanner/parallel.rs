/// Fork-join traversal on a rayon pool.
///
/// Same semantics as the sequential [`Traversal`](super::traversal::Traversal),
/// scheduled differently: every subdirectory of a directory is an
/// independent unit of work, and the parent only computes its own total
/// once all of them have been joined.
///
/// There is no shared result list. Each subtree returns a [`Branch`] with
/// its own records and issues, and the parent folds its children's branches
/// in enumeration order (rayon's indexed `collect` keeps that order). The
/// final record list is therefore identical to the sequential one. The only
/// shared state is the visited set, behind a `parking_lot::Mutex`, and only
/// when the visited guard is enabled; which of two aliases of the same
/// directory wins the race is unspecified.
use super::progress::{record_issue, ScanIssue, ScanStats};
use super::traversal::{read_directory, should_enter};
use super::SCAN_STACK_SIZE;
use crate::config::ScanConfig;
use crate::model::DirectoryRecord;
use crate::platform::{DirId, FileSystem};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Everything one subtree produced.
#[derive(Debug, Default)]
pub struct Branch {
    pub size: u64,
    pub records: Vec<DirectoryRecord>,
    pub issues: Vec<ScanIssue>,
    pub stats: ScanStats,
}

impl Branch {
    /// Append a finished child subtree.
    fn absorb(&mut self, child: Branch) {
        self.size = self.size.saturating_add(child.size);
        self.records.extend(child.records);
        self.issues.extend(child.issues);
        self.stats.merge(child.stats);
    }
}

/// Measure the subtree at `path`, forking one task per subdirectory.
///
/// Must be called from inside a rayon pool (see [`scan_parallel`]) to run
/// on that pool rather than the global one.
pub fn compute_branch<F: FileSystem + ?Sized>(
    fs: &F,
    config: &ScanConfig,
    path: &Path,
    depth: u32,
    visited: &Mutex<HashSet<DirId>>,
) -> Branch {
    let mut branch = Branch::default();

    if !should_enter(fs, config, path, depth, &mut branch.issues, |id| {
        visited.lock().insert(id)
    }) {
        return branch;
    }

    branch.stats.dirs_visited += 1;
    debug!("Scanning {} (depth {depth})", path.display());

    let (files_total, subdirs) =
        match read_directory(fs, path, &mut branch.issues, &mut branch.stats) {
            Ok(contents) => contents,
            Err(err) => {
                record_issue(&mut branch.issues, err, false);
                return branch;
            }
        };
    branch.size = files_total;

    let children: Vec<Branch> = subdirs
        .par_iter()
        .map(|subdir| compute_branch(fs, config, subdir, depth + 1, visited))
        .collect();
    for child in children {
        branch.absorb(child);
    }

    if branch.size >= config.min_size && config.within_depth(depth) {
        branch
            .records
            .push(DirectoryRecord::new(path.to_path_buf(), branch.size, depth));
    }

    branch
}

/// Run a whole scan on a dedicated pool of `threads` workers.
///
/// Falls back to the calling thread if the pool cannot be built.
pub fn scan_parallel<F: FileSystem + ?Sized>(
    fs: &F,
    config: &ScanConfig,
    threads: usize,
) -> Branch {
    let visited = Mutex::new(HashSet::new());
    let run = || compute_branch(fs, config, &config.root, 0, &visited);

    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("windu-scan-{i}"))
        .stack_size(SCAN_STACK_SIZE)
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(err) => {
            warn!("Could not start {threads} scan threads ({err}); scanning on one thread");
            run()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanErrorKind;
    use crate::platform::MemoryFileSystem;
    use crate::scanner::traversal::Traversal;

    fn wide_tree() -> MemoryFileSystem {
        let mut fs = MemoryFileSystem::new()
            .denied_dir("/r/locked")
            .link("/r/loop", "/r")
            .failing_file("/r/x/broken", ScanErrorKind::Io);
        for i in 0..8u64 {
            for j in 0..4u64 {
                fs = fs.file(format!("/r/d{i}/s{j}/f"), (i + 1) * 100 + j);
            }
            fs = fs.file(format!("/r/d{i}/top"), i);
        }
        fs
    }

    #[test]
    fn test_matches_sequential_traversal() {
        let fs = wide_tree();
        let config = ScanConfig::new("/r").with_min_size(300);

        let mut sequential = Traversal::new(&fs, &config);
        let size = sequential.compute_size(Path::new("/r"), 0);
        let (records, issues, stats) = sequential.finish();

        let branch = scan_parallel(&fs, &config, 4);

        assert_eq!(branch.size, size);
        assert_eq!(branch.records, records);
        assert_eq!(branch.issues, issues);
        assert_eq!(branch.stats, stats);
    }

    #[test]
    fn test_depth_bound_applies() {
        let fs = wide_tree();
        let config = ScanConfig::new("/r").with_min_size(0).with_max_depth(Some(1));

        let branch = scan_parallel(&fs, &config, 2);

        assert!(branch.records.iter().all(|r| r.depth <= 1));
        // Only the `top` files at depth 1 are counted: 0 + 1 + ... + 7.
        assert_eq!(branch.size, 28);
    }

    #[test]
    fn test_visited_guard_under_parallelism() {
        let fs = MemoryFileSystem::new()
            .file("/r/a/f", 5)
            .mount("/r/b", "/r/a");
        let config = ScanConfig::new("/r")
            .with_min_size(0)
            .with_visited_guard(true);

        let branch = scan_parallel(&fs, &config, 4);

        // Whichever alias wins, the directory is only counted once.
        assert_eq!(branch.size, 5);
        assert_eq!(
            branch
                .issues
                .iter()
                .filter(|i| i.kind == ScanErrorKind::CycleGuardTripped)
                .count(),
            1
        );
    }
}
