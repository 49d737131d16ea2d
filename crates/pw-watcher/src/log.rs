//! Append-only event log.
//!
//! Each accepted dispatch appends one line:
//!
//! ```text
//! Event: Modified, File: ./watched_directory/example.txt
//! ```
//!
//! The file is opened in append mode and never truncated or rotated. Every
//! line is flushed as soon as it is written.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};

use crate::events::FileEvent;

/// Formats the log line for an event, without the trailing newline.
///
/// # Examples
///
/// ```
/// use pw_watcher::{FileEvent, log::format_line};
/// use pw_core::FileEventKind;
/// use camino::Utf8PathBuf;
///
/// let event = FileEvent::new(Utf8PathBuf::from("w/a.txt"), FileEventKind::Created);
/// assert_eq!(format_line(&event), "Event: Created, File: w/a.txt");
/// ```
#[must_use]
pub fn format_line(event: &FileEvent) -> String {
    format!("Event: {}, File: {}", event.kind, event.path)
}

/// An open, append-mode event log file.
#[derive(Debug)]
pub struct EventLog {
    path: Utf8PathBuf,
    writer: BufWriter<File>,
}

impl EventLog {
    /// Opens `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be opened.
    pub fn open(path: &Utf8Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_owned(),
            writer: BufWriter::new(file),
        })
    }

    /// Returns the path of the log file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Appends one line for `event` and flushes it.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the write or flush fails.
    pub fn append(&mut self, event: &FileEvent) -> io::Result<()> {
        writeln!(self.writer, "{}", format_line(event))?;
        self.writer.flush()
    }
}
