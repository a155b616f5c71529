/// Error taxonomy for scanning.
///
/// Every variant carries the path it occurred at so that log lines and
/// collected [`ScanIssue`](crate::scanner::ScanIssue)s are actionable.
/// Only [`ScanError::ConfigurationInvalid`] is fatal to a run; all other
/// variants are caught at the directory they occur in and downgraded to a
/// zero contribution.
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("access denied: {}", .path.display())]
    AccessDenied { path: PathBuf },

    #[error("not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("skipping reparse point (potential loop): {}", .path.display())]
    CycleGuardTripped { path: PathBuf },

    #[error("path too long: {}", .path.display())]
    PathTooLong { path: PathBuf },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration for '{}': {reason}", .path.display())]
    ConfigurationInvalid { path: PathBuf, reason: String },
}

/// Fieldless discriminant of [`ScanError`], cheap to copy and count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScanErrorKind {
    AccessDenied,
    NotFound,
    CycleGuardTripped,
    PathTooLong,
    Io,
    ConfigurationInvalid,
}

impl ScanErrorKind {
    /// Short label used in log lines and summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::AccessDenied => "access denied",
            Self::NotFound => "not found",
            Self::CycleGuardTripped => "reparse point skipped",
            Self::PathTooLong => "path too long",
            Self::Io => "I/O error",
            Self::ConfigurationInvalid => "invalid configuration",
        }
    }
}

/// `ERROR_FILENAME_EXCED_RANGE` on Windows, `ENAMETOOLONG` elsewhere.
#[cfg(windows)]
const NAME_TOO_LONG_CODES: &[i32] = &[206];
#[cfg(any(target_os = "linux", target_os = "android"))]
const NAME_TOO_LONG_CODES: &[i32] = &[36];
#[cfg(all(not(windows), not(any(target_os = "linux", target_os = "android"))))]
const NAME_TOO_LONG_CODES: &[i32] = &[63];

impl ScanError {
    /// Classify an OS error raised while touching `path`.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        if source
            .raw_os_error()
            .is_some_and(|code| NAME_TOO_LONG_CODES.contains(&code))
        {
            return Self::PathTooLong { path };
        }
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::AccessDenied { path },
            io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Build a fatal configuration error.
    pub fn invalid_config(path: &Path, reason: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ScanErrorKind {
        match self {
            Self::AccessDenied { .. } => ScanErrorKind::AccessDenied,
            Self::NotFound { .. } => ScanErrorKind::NotFound,
            Self::CycleGuardTripped { .. } => ScanErrorKind::CycleGuardTripped,
            Self::PathTooLong { .. } => ScanErrorKind::PathTooLong,
            Self::Io { .. } => ScanErrorKind::Io,
            Self::ConfigurationInvalid { .. } => ScanErrorKind::ConfigurationInvalid,
        }
    }

    /// The path this error occurred at.
    pub fn path(&self) -> &Path {
        match self {
            Self::AccessDenied { path }
            | Self::NotFound { path }
            | Self::CycleGuardTripped { path }
            | Self::PathTooLong { path }
            | Self::Io { path, .. }
            | Self::ConfigurationInvalid { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classifies_kinds() {
        let p = Path::new("/data/x");
        let denied = ScanError::from_io(p, io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(denied.kind(), ScanErrorKind::AccessDenied);

        let missing = ScanError::from_io(p, io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(missing.kind(), ScanErrorKind::NotFound);

        let other = ScanError::from_io(p, io::Error::other("disk on fire"));
        assert_eq!(other.kind(), ScanErrorKind::Io);
        assert_eq!(other.path(), p);
    }

    #[test]
    fn test_from_io_detects_name_too_long() {
        let code = NAME_TOO_LONG_CODES[0];
        let err = ScanError::from_io(Path::new("/deep"), io::Error::from_raw_os_error(code));
        assert_eq!(err.kind(), ScanErrorKind::PathTooLong);
    }

    #[test]
    fn test_display_includes_path() {
        let err = ScanError::AccessDenied {
            path: PathBuf::from("/data/secret"),
        };
        assert_eq!(err.to_string(), "access denied: /data/secret");
    }
}
