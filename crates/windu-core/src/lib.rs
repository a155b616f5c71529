/// windu Core: directory traversal, size aggregation, and reporting.
///
/// This crate contains all business logic with zero console dependencies.
/// The `windu` binary is a thin wrapper that parses arguments, echoes the
/// report, and persists it.
///
/// # Modules
///
/// - [`model`]: Directory records and size formatting helpers.
/// - [`config`]: Immutable per-run scan configuration.
/// - [`error`]: Error taxonomy shared by the scanner and the platform layer.
/// - [`platform`]: Filesystem seam (real OS and in-memory implementations).
/// - [`scanner`]: Post-order traversal engine, sequential and fork-join.
/// - [`report`]: Report assembly, export formats, and persistence.
pub mod config;
pub mod error;
pub mod model;
pub mod platform;
pub mod report;
pub mod scanner;

pub use config::{ScanConfig, ScanMode};
pub use error::{ScanError, ScanErrorKind};
pub use model::DirectoryRecord;
pub use scanner::{scan, ScanOutcome};
