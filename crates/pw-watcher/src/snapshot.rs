//! Per-root snapshot and diff engine.
//!
//! A [`Snapshot`] remembers the last-observed modification time of every
//! immediate child of one watched root. [`Snapshot::scan`] re-reads the
//! directory, classifies what changed since the previous call, and updates
//! the snapshot in place so that it becomes the baseline of the next tick.
//!
//! # Classification
//!
//! ```text
//! child not in snapshot          -> Created   (insert)
//! child with a different mtime   -> Modified  (update)
//! snapshot entry not on disk     -> Deleted   (remove)
//! ```
//!
//! Created and Modified events come first, in `read_dir` order; Deleted
//! events follow. The traversal is not recursive: a subdirectory is one
//! entry whose own mtime changes when its direct contents change.

use std::fs;
use std::io;
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use pw_core::FileEventKind;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::WatchError;
use crate::events::{EventBatch, FileEvent};

/// Last-observed modification times for the children of one root.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    entries: FxHashMap<Utf8PathBuf, SystemTime>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    ///
    /// The first scan of a non-empty root reports every child as created.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tracked entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries are tracked.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the recorded modification time of `path`, if tracked.
    #[inline]
    #[must_use]
    pub fn modified(&self, path: &Utf8Path) -> Option<SystemTime> {
        self.entries.get(path).copied()
    }

    /// Returns `true` if `path` is tracked.
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Returns a copy of the tracked entries, sorted by path.
    #[must_use]
    pub fn entries(&self) -> Vec<(Utf8PathBuf, SystemTime)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(path, time)| (path.clone(), *time))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Scans `root` once and classifies the changes since the previous scan.
    ///
    /// Symlinked children are timestamped through the link, so a change to
    /// the target is reported as a modification of the link path. A link
    /// whose target is missing falls back to the link's own timestamp.
    ///
    /// Entries that cannot be inspected during this scan (vanished between
    /// enumeration and `metadata`, permission denied, non-UTF-8 names) are
    /// skipped without producing an event; an entry that was enumerated but
    /// whose metadata failed is not reported as deleted. If the listing
    /// itself fails part-way, no entry is reported as deleted on that tick.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Io`] if `root` itself cannot be read. The
    /// snapshot is left untouched in that case.
    pub fn scan(&mut self, root: &Utf8Path) -> Result<EventBatch, WatchError> {
        let dir = fs::read_dir(root)?;
        let observed = dir.filter_map(|entry| observe(root, entry));
        Ok(self.apply(observed))
    }

    /// Diffs one listing against the snapshot and updates it in place.
    fn apply(&mut self, observed: impl IntoIterator<Item = Observed>) -> EventBatch {
        let mut batch = EventBatch::new();
        let mut seen: FxHashSet<Utf8PathBuf> = FxHashSet::default();
        let mut complete = true;

        for observation in observed {
            let (path, modified) = match observation {
                Observed::Stamped(path, modified) => (path, modified),
                Observed::Unstamped(path) => {
                    seen.insert(path);
                    continue;
                }
                Observed::Lost => {
                    complete = false;
                    continue;
                }
            };

            match self.entries.get_mut(&path) {
                None => {
                    self.entries.insert(path.clone(), modified);
                    batch.push(FileEvent::new(path.clone(), FileEventKind::Created));
                }
                Some(stored) if *stored != modified => {
                    *stored = modified;
                    batch.push(FileEvent::new(path.clone(), FileEventKind::Modified));
                }
                Some(_) => {}
            }
            seen.insert(path);
        }

        // A lost entry may be any tracked path
        if !complete {
            return batch;
        }

        let deleted: Vec<Utf8PathBuf> = self
            .entries
            .keys()
            .filter(|path| !seen.contains(*path))
            .cloned()
            .collect();
        for path in deleted {
            self.entries.remove(&path);
            batch.push(FileEvent::new(path, FileEventKind::Deleted));
        }

        batch
    }
}

/// What one `read_dir` item contributed to a scan.
#[derive(Debug)]
enum Observed {
    /// A child and its modification time.
    Stamped(Utf8PathBuf, SystemTime),
    /// A child that exists but could not be timestamped this tick.
    Unstamped(Utf8PathBuf),
    /// The listing failed to yield an entry.
    Lost,
}

/// Turns one listing item into an observation.
///
/// Non-UTF-8 names yield `None`: they can never be tracked, so they take
/// no part in the diff.
fn observe(root: &Utf8Path, entry: io::Result<fs::DirEntry>) -> Option<Observed> {
    let entry = match entry {
        Ok(entry) => entry,
        Err(error) => {
            tracing::warn!(root = %root, error = %error, "Skipping unreadable directory entry");
            return Some(Observed::Lost);
        }
    };

    let path = match Utf8PathBuf::try_from(entry.path()) {
        Ok(path) => path,
        Err(e) => {
            let err = WatchError::non_utf8_path(e.into_path_buf());
            tracing::warn!(root = %root, error = %err, "Skipping directory entry");
            return None;
        }
    };

    // Follow symlinks; a dangling link keeps its own timestamp
    let stamped = fs::metadata(&path)
        .or_else(|_| entry.metadata())
        .and_then(|meta| meta.modified());
    match stamped {
        Ok(time) => Some(Observed::Stamped(path, time)),
        Err(error) => {
            tracing::debug!(path = %path, error = %error, "Skipping entry for this tick");
            Some(Observed::Unstamped(path))
        }
    }
}
