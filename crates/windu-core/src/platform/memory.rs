/// In-memory [`FileSystem`] with scriptable failures.
///
/// Used by tests to exercise every degraded path of the scanner without
/// depending on the permissions of the machine running them: denied
/// directories, files whose metadata read fails, reparse points that really
/// loop back onto an ancestor, and bind-mount style aliases that loop
/// without being reparse points.
///
/// ```
/// use windu_core::platform::MemoryFileSystem;
///
/// let fs = MemoryFileSystem::new()
///     .file("/data/a.bin", 500)
///     .denied_dir("/data/secret")
///     .link("/data/link", "/data");
/// ```
use super::{DirId, FileEntry, FileSystem};
use crate::error::{ScanError, ScanErrorKind};
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Upper bound on link substitutions while resolving one path.
const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum Node {
    Dir {
        files_error: Option<ScanErrorKind>,
        subdirs_error: Option<ScanErrorKind>,
    },
    File {
        len: u64,
        fail: Option<ScanErrorKind>,
    },
    /// Alias of another directory. `reparse` distinguishes a symlink or
    /// junction from a mount that looks like an ordinary directory.
    Alias { target: PathBuf, reparse: bool },
}

/// Listings enumerate children in the order they were added, so two trees
/// built in different orders exercise different enumeration orders.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    nodes: BTreeMap<PathBuf, Node>,
    /// Child names of each directory, in insertion order.
    listing: BTreeMap<PathBuf, Vec<OsString>>,
    aliases: BTreeSet<PathBuf>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an (empty) directory and any missing ancestors.
    pub fn dir(mut self, path: impl AsRef<Path>) -> Self {
        self.insert_dir(path.as_ref());
        self
    }

    /// Add a file of `len` bytes.
    pub fn file(self, path: impl AsRef<Path>, len: u64) -> Self {
        self.insert(path.as_ref(), Node::File { len, fail: None })
    }

    /// Add a file whose metadata read fails with `kind`.
    pub fn failing_file(self, path: impl AsRef<Path>, kind: ScanErrorKind) -> Self {
        self.insert(
            path.as_ref(),
            Node::File {
                len: 0,
                fail: Some(kind),
            },
        )
    }

    /// Add a directory whose listings are all refused.
    pub fn denied_dir(self, path: impl AsRef<Path>) -> Self {
        self.failing_dir(path, ScanErrorKind::AccessDenied)
    }

    /// Add a directory whose listings both fail with `kind`.
    pub fn failing_dir(self, path: impl AsRef<Path>, kind: ScanErrorKind) -> Self {
        self.insert(
            path.as_ref(),
            Node::Dir {
                files_error: Some(kind),
                subdirs_error: Some(kind),
            },
        )
    }

    /// Refuse the file listing of an existing or new directory, but still
    /// allow its subdirectories to be listed.
    pub fn deny_file_listing(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.insert_dir(path);
        if let Some(Node::Dir { files_error, .. }) = self.nodes.get_mut(path) {
            *files_error = Some(ScanErrorKind::AccessDenied);
        }
        self
    }

    /// Refuse the subdirectory listing of an existing or new directory, but
    /// still allow its files to be listed.
    pub fn deny_subdirectory_listing(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.insert_dir(path);
        if let Some(Node::Dir { subdirs_error, .. }) = self.nodes.get_mut(path) {
            *subdirs_error = Some(ScanErrorKind::AccessDenied);
        }
        self
    }

    /// Add a symlink/junction at `path` that resolves to `target`.
    pub fn link(self, path: impl AsRef<Path>, target: impl AsRef<Path>) -> Self {
        self.insert(
            path.as_ref(),
            Node::Alias {
                target: target.as_ref().to_path_buf(),
                reparse: true,
            },
        )
    }

    /// Add a bind-mount style alias: it resolves to `target` but is not
    /// flagged as a reparse point.
    pub fn mount(self, path: impl AsRef<Path>, target: impl AsRef<Path>) -> Self {
        self.insert(
            path.as_ref(),
            Node::Alias {
                target: target.as_ref().to_path_buf(),
                reparse: false,
            },
        )
    }

    fn insert(mut self, path: &Path, node: Node) -> Self {
        if let Some(parent) = path.parent() {
            self.insert_dir(parent);
        }
        self.put(path, node);
        self
    }

    /// Store `node` at `path` and list it under its parent.
    fn put(&mut self, path: &Path, node: Node) {
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            let names = self.listing.entry(parent.to_path_buf()).or_default();
            if !names.iter().any(|known| known == name) {
                names.push(name.to_os_string());
            }
        }
        if matches!(node, Node::Alias { .. }) {
            self.aliases.insert(path.to_path_buf());
        } else {
            self.aliases.remove(path);
        }
        self.nodes.insert(path.to_path_buf(), node);
    }

    fn insert_dir(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if self.nodes.contains_key(ancestor) {
                break;
            }
            self.put(
                ancestor,
                Node::Dir {
                    files_error: None,
                    subdirs_error: None,
                },
            );
        }
    }

    /// Follow every alias along `path`. Alias targets are expected to be
    /// alias-free paths.
    fn resolve(&self, path: &Path) -> Result<PathBuf, ScanError> {
        let mut resolved = PathBuf::new();
        let mut hops = 0;
        for component in path.components() {
            match component {
                Component::CurDir => continue,
                Component::ParentDir => {
                    resolved.pop();
                }
                other => resolved.push(other.as_os_str()),
            }
            if !self.aliases.contains(&resolved) {
                continue;
            }
            if let Some(Node::Alias { target, .. }) = self.nodes.get(&resolved) {
                hops += 1;
                if hops > MAX_LINK_HOPS {
                    return Err(ScanError::Io {
                        path: path.to_path_buf(),
                        source: io::Error::other("too many levels of links"),
                    });
                }
                resolved = target.clone();
            }
        }
        Ok(resolved)
    }

    /// Resolve `dir` and check that it is a directory, raising the listing
    /// failure `scripted` picks for it, if any.
    fn open_dir(
        &self,
        dir: &Path,
        scripted: impl Fn(&Node) -> Option<ScanErrorKind>,
    ) -> Result<PathBuf, ScanError> {
        let resolved = self.resolve(dir)?;
        match self.nodes.get(&resolved) {
            None => Err(ScanError::NotFound {
                path: dir.to_path_buf(),
            }),
            Some(node) => match (scripted(node), node) {
                (Some(kind), _) => Err(simulated_error(kind, dir)),
                (None, Node::Dir { .. }) => Ok(resolved),
                (None, _) => Err(ScanError::Io {
                    path: dir.to_path_buf(),
                    source: io::Error::other("not a directory"),
                }),
            },
        }
    }

    /// Immediate children of an already resolved directory, by name.
    fn children<'a>(
        &'a self,
        resolved: &'a Path,
    ) -> impl Iterator<Item = (&'a OsStr, &'a Node)> {
        self.listing
            .get(resolved)
            .into_iter()
            .flatten()
            .filter_map(move |name| {
                let node = self.nodes.get(&resolved.join(name))?;
                Some((name.as_os_str(), node))
            })
    }

    /// The node `path` names, without following an alias in its last
    /// component (the `symlink_metadata` view).
    fn node_no_follow(&self, path: &Path) -> Result<&Node, ScanError> {
        let key = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => self.resolve(parent)?.join(name),
            _ => path.to_path_buf(),
        };
        self.nodes.get(&key).ok_or_else(|| ScanError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

fn simulated_error(kind: ScanErrorKind, path: &Path) -> ScanError {
    let path = path.to_path_buf();
    match kind {
        ScanErrorKind::AccessDenied => ScanError::AccessDenied { path },
        ScanErrorKind::NotFound => ScanError::NotFound { path },
        ScanErrorKind::CycleGuardTripped => ScanError::CycleGuardTripped { path },
        ScanErrorKind::PathTooLong => ScanError::PathTooLong { path },
        ScanErrorKind::Io => ScanError::Io {
            path,
            source: io::Error::other("simulated I/O failure"),
        },
        ScanErrorKind::ConfigurationInvalid => ScanError::ConfigurationInvalid {
            path,
            reason: "simulated".to_string(),
        },
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_files(&self, dir: &Path) -> Result<Vec<FileEntry>, ScanError> {
        let resolved = self.open_dir(dir, |node| match node {
            Node::Dir { files_error, .. } => *files_error,
            _ => None,
        })?;
        Ok(self
            .children(&resolved)
            .filter_map(|(name, node)| {
                let Node::File { len, fail } = node else {
                    return None;
                };
                let path = dir.join(name);
                let len = match fail {
                    Some(kind) => Err(simulated_error(*kind, &path)),
                    None => Ok(*len),
                };
                Some(FileEntry { path, len })
            })
            .collect())
    }

    fn list_subdirectories(&self, dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let resolved = self.open_dir(dir, |node| match node {
            Node::Dir { subdirs_error, .. } => *subdirs_error,
            _ => None,
        })?;
        Ok(self
            .children(&resolved)
            .filter(|(_, node)| matches!(node, Node::Dir { .. } | Node::Alias { .. }))
            .map(|(name, _)| dir.join(name))
            .collect())
    }

    fn is_reparse_point(&self, dir: &Path) -> Result<bool, ScanError> {
        Ok(matches!(
            self.node_no_follow(dir)?,
            Node::Alias { reparse: true, .. }
        ))
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve(path)
            .is_ok_and(|resolved| matches!(self.nodes.get(&resolved), Some(Node::Dir { .. })))
    }

    fn identity(&self, dir: &Path) -> Option<DirId> {
        let resolved = self.resolve(dir).ok()?;
        let ino = self.nodes.keys().position(|key| *key == resolved)?;
        Some(DirId {
            dev: 0,
            ino: ino as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creates_ancestors() {
        let fs = MemoryFileSystem::new().file("/data/logs/b.bin", 600);
        assert!(fs.is_dir(Path::new("/data")));
        assert!(fs.is_dir(Path::new("/data/logs")));
        assert!(!fs.is_dir(Path::new("/data/logs/b.bin")));
        assert!(!fs.is_dir(Path::new("/nope")));
    }

    #[test]
    fn test_listing_splits_files_and_dirs() {
        let fs = MemoryFileSystem::new()
            .file("/data/a.bin", 500)
            .file("/data/logs/b.bin", 600);

        let files = fs.read_files(Path::new("/data")).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, PathBuf::from("/data/a.bin"));
        assert_eq!(*files[0].len.as_ref().unwrap(), 500);

        let dirs = fs.list_subdirectories(Path::new("/data")).unwrap();
        assert_eq!(dirs, vec![PathBuf::from("/data/logs")]);
    }

    #[test]
    fn test_listing_follows_insertion_order() {
        let fs = MemoryFileSystem::new()
            .dir("/data/zeta")
            .dir("/data/alpha")
            .dir("/data/mid");
        let dirs = fs.list_subdirectories(Path::new("/data")).unwrap();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/data/zeta"),
                PathBuf::from("/data/alpha"),
                PathBuf::from("/data/mid"),
            ]
        );
    }

    #[test]
    fn test_denied_subdirectory_listing_keeps_files() {
        let fs = MemoryFileSystem::new()
            .file("/data/a.bin", 5)
            .dir("/data/sub")
            .deny_subdirectory_listing("/data");
        let err = fs.list_subdirectories(Path::new("/data")).unwrap_err();
        assert_eq!(err.kind(), ScanErrorKind::AccessDenied);
        assert_eq!(fs.read_files(Path::new("/data")).unwrap().len(), 1);
    }

    #[test]
    fn test_denied_dir_refuses_listing() {
        let fs = MemoryFileSystem::new().denied_dir("/data/secret");
        let err = fs.list_subdirectories(Path::new("/data/secret")).unwrap_err();
        assert_eq!(err.kind(), ScanErrorKind::AccessDenied);
        let err = fs.read_files(Path::new("/data/secret")).unwrap_err();
        assert_eq!(err.kind(), ScanErrorKind::AccessDenied);
    }

    #[test]
    fn test_link_resolves_to_target() {
        let fs = MemoryFileSystem::new()
            .file("/data/a.bin", 500)
            .link("/data/link", "/data");

        assert!(fs.is_reparse_point(Path::new("/data/link")).unwrap());
        assert!(!fs.is_reparse_point(Path::new("/data")).unwrap());

        // Listing through the link sees the target's contents under the
        // link's own path, so a naive walk would loop forever.
        let files = fs.read_files(Path::new("/data/link")).unwrap();
        assert_eq!(files[0].path, PathBuf::from("/data/link/a.bin"));
        let dirs = fs.list_subdirectories(Path::new("/data/link/link")).unwrap();
        assert_eq!(dirs, vec![PathBuf::from("/data/link/link/link")]);
    }

    #[test]
    fn test_mount_is_not_reparse_but_shares_identity() {
        let fs = MemoryFileSystem::new()
            .dir("/data/real")
            .mount("/data/alias", "/data/real");
        assert!(!fs.is_reparse_point(Path::new("/data/alias")).unwrap());
        assert_eq!(
            fs.identity(Path::new("/data/alias")),
            fs.identity(Path::new("/data/real"))
        );
    }

    #[test]
    fn test_failing_file_reports_its_error() {
        let fs = MemoryFileSystem::new()
            .failing_file("/data/locked.bin", ScanErrorKind::AccessDenied);
        let files = fs.read_files(Path::new("/data")).unwrap();
        assert_eq!(
            files[0].len.as_ref().unwrap_err().kind(),
            ScanErrorKind::AccessDenied
        );
    }
}
