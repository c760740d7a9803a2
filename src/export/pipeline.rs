use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use super::options::{CsvOptions, ExportReport};
use super::sinks::{CsvSink, UserSink};
use crate::types::UserRecord;

/// Append `users` to the CSV file at `path`, never touching existing content.
///
/// The header row is written only when the file is missing or empty.
///
/// # Errors
/// Returns an error if the file (or its parent directory) cannot be created or written.
pub fn append_users(
    path: impl AsRef<Path>,
    users: &[UserRecord],
    opts: &CsvOptions,
) -> io::Result<ExportReport> {
    let dest = path.as_ref();
    if users.len() > 1 {
        log::info!("Writing {} users to CSV file: {}", users.len(), dest.display());
    }
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let is_empty = std::fs::metadata(dest).map(|m| m.len() == 0).unwrap_or(true);
    let write_header = opts.write_headers && is_empty;
    let file = OpenOptions::new().create(true).append(true).open(dest)?;
    let report = write_users(file, users, opts.delimiter, write_header)?;
    if users.len() > 1 {
        log::info!("Data written to CSV file: {}", dest.display());
    }
    Ok(report)
}

/// Write `users` to an arbitrary writer.
///
/// # Errors
/// Returns serialization or I/O errors from the underlying writer.
pub fn write_users<W: Write>(
    writer: W,
    users: &[UserRecord],
    delimiter: u8,
    write_header: bool,
) -> io::Result<ExportReport> {
    let mut sink: Box<dyn UserSink> = Box::new(CsvSink::new(writer, delimiter, write_header));
    let mut report = ExportReport { written: 0, wrote_header: write_header && !users.is_empty() };
    for user in users {
        sink.write_user(user)?;
        report.written += 1;
    }
    sink.finish()?;
    Ok(report)
}
