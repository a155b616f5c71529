/// Per-run scan configuration.
///
/// Assembled once by the caller (the CLI) and never mutated while the
/// traversal runs.
use crate::error::ScanError;
use crate::model::size::{gigabytes_to_bytes, BYTES_PER_GB};
use crate::platform::FileSystem;
use std::path::{Path, PathBuf};

/// Sentinel accepted on the command line for "no depth limit".
pub const UNBOUNDED_DEPTH_SENTINEL: i64 = -1;

/// How the traversal engine schedules sibling subdirectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Single-threaded depth-first recursion.
    #[default]
    Sequential,
    /// Fork-join over sibling subdirectories on a dedicated rayon pool.
    Parallel { threads: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Directory the traversal starts from (depth 0).
    pub root: PathBuf,

    /// Minimum cumulative size, in bytes, for a directory to be reported.
    pub min_size: u64,

    /// Deepest depth that is entered and reported. `None` is unbounded.
    ///
    /// Directories below this depth are not descended into and contribute
    /// nothing to their ancestors' totals.
    pub max_depth: Option<u32>,

    pub mode: ScanMode,

    /// Track visited directories by device and inode and refuse to enter
    /// one twice. Catches cycles that do not go through a reparse point
    /// (bind mounts, for example).
    pub visited_guard: bool,
}

impl ScanConfig {
    /// Unbounded, sequential scan reporting everything of at least 1 GB.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            min_size: BYTES_PER_GB,
            max_depth: None,
            mode: ScanMode::Sequential,
            visited_guard: false,
        }
    }

    pub fn with_min_size(mut self, bytes: u64) -> Self {
        self.min_size = bytes;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_visited_guard(mut self, enabled: bool) -> Self {
        self.visited_guard = enabled;
        self
    }

    /// Set the threshold from a gigabyte figure (fractions allowed).
    pub fn with_min_size_gb(self, gb: f64) -> Result<Self, ScanError> {
        if !gb.is_finite() || gb < 0.0 {
            return Err(ScanError::invalid_config(
                &self.root,
                format!("minimum size must be a non-negative number of GB, got {gb}"),
            ));
        }
        let bytes = gigabytes_to_bytes(gb);
        Ok(self.with_min_size(bytes))
    }

    /// Interpret a command-line depth where `-1` means unbounded.
    pub fn max_depth_from_sentinel(root: &Path, depth: i64) -> Result<Option<u32>, ScanError> {
        if depth == UNBOUNDED_DEPTH_SENTINEL {
            return Ok(None);
        }
        u32::try_from(depth).map(Some).map_err(|_| {
            ScanError::invalid_config(
                root,
                format!("max depth must be -1 (unbounded) or a non-negative integer, got {depth}"),
            )
        })
    }

    /// Check that the root exists and is a directory.
    ///
    /// This is the only check that stops a run before it starts.
    pub fn validate<F: FileSystem + ?Sized>(&self, fs: &F) -> Result<(), ScanError> {
        if fs.is_dir(&self.root) {
            Ok(())
        } else {
            Err(ScanError::invalid_config(
                &self.root,
                "the specified path could not be found",
            ))
        }
    }

    /// `true` when `depth` lies inside the configured bound.
    #[inline]
    pub fn within_depth(&self, depth: u32) -> bool {
        self.max_depth.is_none_or(|max| depth <= max)
    }
}
