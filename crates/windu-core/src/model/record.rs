/// A single directory that qualified for the report.
use serde::Serialize;
use std::path::PathBuf;

/// One reportable directory.
///
/// Records are created exactly once, while the traversal unwinds out of the
/// directory, and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DirectoryRecord {
    /// Full path of the directory. Unique within one report.
    pub path: PathBuf,

    /// Total apparent size in bytes: every regular file in this directory
    /// and in every descendant that was actually traversed.
    pub byte_size: u64,

    /// Distance from the scan root (the root itself is depth 0).
    pub depth: u32,
}

impl DirectoryRecord {
    pub fn new(path: PathBuf, byte_size: u64, depth: u32) -> Self {
        Self {
            path,
            byte_size,
            depth,
        }
    }
}
