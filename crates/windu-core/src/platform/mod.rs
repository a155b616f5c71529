/// Platform layer: the filesystem seam the traversal engine reads through.
///
/// The engine never touches `std::fs` directly. It consumes the
/// [`FileSystem`] trait so the same traversal runs against the real disk
/// ([`OsFileSystem`]) or a scripted in-memory tree ([`MemoryFileSystem`])
/// whose failures can be injected deterministically.
pub mod memory;
pub mod os;

pub use memory::MemoryFileSystem;
pub use os::{system_root, OsFileSystem};

use crate::error::ScanError;
use std::path::{Path, PathBuf};

/// A regular file found while listing a directory.
///
/// The length is resolved per entry so that a single unreadable file is
/// distinguishable from a directory whose listing failed outright. An entry
/// that could not be read mid-listing carries the directory's path and the
/// error.
#[derive(Debug)]
pub struct FileEntry {
    pub path: PathBuf,
    pub len: Result<u64, ScanError>,
}

/// Identity of a directory on its volume (device + inode or equivalent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirId {
    pub dev: u64,
    pub ino: u64,
}

/// Read-only view of a filesystem, as consumed by the scanner.
///
/// Implementations must be `Sync`: the parallel scanner calls them from
/// several rayon workers at once.
pub trait FileSystem: Sync {
    /// List the immediate non-directory entries of `dir` with their lengths.
    fn read_files(&self, dir: &Path) -> Result<Vec<FileEntry>, ScanError>;

    /// List the full paths of the immediate subdirectories of `dir`.
    fn list_subdirectories(&self, dir: &Path) -> Result<Vec<PathBuf>, ScanError>;

    /// `true` if `dir` itself is a symlink, junction, or other reparse point.
    fn is_reparse_point(&self, dir: &Path) -> Result<bool, ScanError>;

    /// `true` if `path` exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Volume-level identity of `dir`, when the platform exposes one.
    fn identity(&self, dir: &Path) -> Option<DirId>;
}
