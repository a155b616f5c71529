/// Data model for windu scan results.
///
/// A scan produces a flat list of [`DirectoryRecord`]s, one per directory
/// whose cumulative size met the configured threshold.
pub mod record;
pub mod size;

pub use record::DirectoryRecord;
