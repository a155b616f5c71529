/// `std::fs`-backed implementation of [`FileSystem`].
///
/// Sizes are apparent sizes of regular files taken from `symlink_metadata`.
/// Links are never followed for sizing: a link that resolves to a directory
/// is listed as a subdirectory (the scanner's reparse-point check then
/// refuses to enter it), and any other link adds nothing.
use super::{DirId, FileEntry, FileSystem};
use crate::error::ScanError;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl OsFileSystem {
    /// Read `dir` once and keep the entries selected by `keep`.
    ///
    /// An entry that fails mid-listing is returned as an error in place.
    fn entries(
        &self,
        dir: &Path,
        mut keep: impl FnMut(&DirEntry) -> bool,
    ) -> Result<Vec<Result<PathBuf, ScanError>>, ScanError> {
        let reader = fs::read_dir(dir).map_err(|err| ScanError::from_io(dir, err))?;
        let mut paths = Vec::new();
        for entry in reader {
            match entry {
                Ok(entry) if keep(&entry) => paths.push(Ok(entry.path())),
                Ok(_) => {}
                Err(err) => paths.push(Err(ScanError::from_io(dir, err))),
            }
        }
        Ok(paths)
    }
}

/// Directories, plus links that resolve to directories.
fn is_directory_entry(entry: &DirEntry) -> bool {
    match entry.file_type() {
        Ok(ft) if ft.is_dir() => true,
        Ok(ft) if ft.is_symlink() => fs::metadata(entry.path())
            .map(|meta| meta.is_dir())
            .unwrap_or(false),
        _ => false,
    }
}

/// Regular files. An entry whose type cannot be read is kept so that the
/// metadata read reports why.
fn is_file_entry(entry: &DirEntry) -> bool {
    match entry.file_type() {
        Ok(ft) if ft.is_file() => true,
        Ok(ft) => {
            if !ft.is_dir() {
                debug!("Not sizing non-regular entry {}", entry.path().display());
            }
            false
        }
        Err(_) => true,
    }
}

impl FileSystem for OsFileSystem {
    fn read_files(&self, dir: &Path) -> Result<Vec<FileEntry>, ScanError> {
        let paths = self.entries(dir, is_file_entry)?;
        Ok(paths
            .into_iter()
            .map(|entry| match entry {
                Ok(path) => {
                    let len = fs::symlink_metadata(&path)
                        .map(|meta| meta.len())
                        .map_err(|err| ScanError::from_io(&path, err));
                    FileEntry { path, len }
                }
                // Reported once, from this listing.
                Err(err) => FileEntry {
                    path: dir.to_path_buf(),
                    len: Err(err),
                },
            })
            .collect())
    }

    fn list_subdirectories(&self, dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let paths = self.entries(dir, is_directory_entry)?;
        Ok(paths
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(err) => {
                    debug!("Skipping unreadable entry in {}: {err}", dir.display());
                    None
                }
            })
            .collect())
    }

    fn is_reparse_point(&self, dir: &Path) -> Result<bool, ScanError> {
        let meta = fs::symlink_metadata(dir).map_err(|err| ScanError::from_io(dir, err))?;
        Ok(is_reparse(&meta))
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    #[cfg(unix)]
    fn identity(&self, dir: &Path) -> Option<DirId> {
        use std::os::unix::fs::MetadataExt;
        let meta = fs::metadata(dir).ok()?;
        Some(DirId {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    // Stable Rust exposes no file index on Windows; junctions are already
    // stopped by the reparse-point check.
    #[cfg(not(unix))]
    fn identity(&self, _dir: &Path) -> Option<DirId> {
        None
    }
}

#[cfg(windows)]
fn is_reparse(meta: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    use windows::Win32::Storage::FileSystem::FILE_ATTRIBUTE_REPARSE_POINT;
    meta.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT.0 != 0
}

#[cfg(not(windows))]
fn is_reparse(meta: &fs::Metadata) -> bool {
    meta.file_type().is_symlink()
}

/// Root of the system drive: `%SystemDrive%\` on Windows, `/` elsewhere.
pub fn system_root() -> PathBuf {
    #[cfg(windows)]
    {
        let drive = std::env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string());
        PathBuf::from(format!("{drive}\\"))
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_bytes(path: &Path, n: usize) {
        let mut f = fs::File::create(path).unwrap();
        f.write_all(&vec![0u8; n]).unwrap();
    }

    #[test]
    fn test_lists_files_and_dirs_separately() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        write_bytes(&tmp.path().join("a.bin"), 10);
        write_bytes(&tmp.path().join("b.bin"), 20);

        let fs_impl = OsFileSystem;
        let mut files = fs_impl.read_files(tmp.path()).unwrap();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(files.len(), 2);
        assert_eq!(*files[0].len.as_ref().unwrap(), 10);
        assert_eq!(*files[1].len.as_ref().unwrap(), 20);

        let dirs = fs_impl.list_subdirectories(tmp.path()).unwrap();
        assert_eq!(dirs, vec![tmp.path().join("sub")]);
    }

    #[test]
    fn test_missing_dir_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = OsFileSystem
            .list_subdirectories(&tmp.path().join("nope"))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ScanErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_dir_is_listed_and_flagged() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real");
        fs::create_dir(&real).unwrap();
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut dirs = OsFileSystem.list_subdirectories(tmp.path()).unwrap();
        dirs.sort();
        assert_eq!(dirs, vec![link.clone(), real.clone()]);
        assert!(OsFileSystem.is_reparse_point(&link).unwrap());
        assert!(!OsFileSystem.is_reparse_point(&real).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_links_add_nothing() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real.bin");
        write_bytes(&real, 100);
        std::os::unix::fs::symlink(&real, tmp.path().join("alias.bin")).unwrap();
        std::os::unix::fs::symlink(
            tmp.path().join("a/target/that/does/not/exist/anywhere.bin"),
            tmp.path().join("dangling"),
        )
        .unwrap();

        let files = OsFileSystem.read_files(tmp.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, real);
        assert_eq!(*files[0].len.as_ref().unwrap(), 100);
        assert!(OsFileSystem.list_subdirectories(tmp.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_identity_matches_through_link() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real");
        fs::create_dir(&real).unwrap();
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert_eq!(OsFileSystem.identity(&real), OsFileSystem.identity(&link));
        assert!(OsFileSystem.identity(&real).is_some());
    }
}
