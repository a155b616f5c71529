/// Writing a rendered report to disk.
///
/// The report file is cleared before the scan starts and appended to once
/// the report is rendered. Failing to clear an old report is not fatal.
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::warn;

/// Delete a report left by a previous run.
///
/// Returns `false` (after logging a warning) if an existing file could not
/// be removed; the caller carries on and the new report is appended to it.
pub fn clear_previous(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(err) if err.kind() == io::ErrorKind::NotFound => true,
        Err(err) => {
            warn!(
                "Could not clear previous results file '{}': {err}",
                path.display()
            );
            false
        }
    }
}

/// Append `lines` to `path`, creating the file if needed.
pub fn append_lines(path: &Path, lines: &[String]) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()
}
