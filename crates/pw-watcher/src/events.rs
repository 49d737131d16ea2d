//! Event types for file change notifications.
//!
//! This module provides the [`FileEvent`] produced by a polling tick and the
//! [`EventBatch`] that groups every event of one tick.
//!
//! # Event Flow
//!
//! ```text
//! Polling tick (read_dir + mtime diff)
//!        │
//!        ▼
//!   EventBatch (Created/Modified first, then Deleted)
//!        │
//!        ▼
//!   Dispatcher (callback lookup + root filter)
//!        │
//!        ▼
//!   Callback, then event log line
//! ```

use camino::Utf8PathBuf;
use pw_core::FileEventKind;
use smallvec::SmallVec;

/// A classified change to one entry of a watched root.
///
/// # Examples
///
/// ```
/// use pw_watcher::FileEvent;
/// use pw_core::FileEventKind;
/// use camino::Utf8PathBuf;
///
/// let event = FileEvent::new(Utf8PathBuf::from("watched/example.txt"), FileEventKind::Modified);
/// assert_eq!(event.path.as_str(), "watched/example.txt");
/// assert_eq!(event.kind, FileEventKind::Modified);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEvent {
    /// The path of the entry, formed by joining the root with the entry name.
    pub path: Utf8PathBuf,

    /// What happened to the entry.
    pub kind: FileEventKind,
}

impl FileEvent {
    /// Creates a new file event.
    #[inline]
    #[must_use]
    pub const fn new(path: Utf8PathBuf, kind: FileEventKind) -> Self {
        Self { path, kind }
    }
}

/// The events classified during a single polling tick.
///
/// Uses [`SmallVec`] with inline storage for up to 8 events, since most ticks
/// observe few or no changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBatch {
    /// The events in tick order.
    pub events: SmallVec<[FileEvent; 8]>,
}

impl EventBatch {
    /// Creates a new empty batch.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event to the batch.
    #[inline]
    pub fn push(&mut self, event: FileEvent) {
        self.events.push(event);
    }

    /// Returns the number of events in this batch.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the batch contains no events.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns an iterator over the events.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &FileEvent> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a EventBatch {
    type Item = &'a FileEvent;
    type IntoIter = std::slice::Iter<'a, FileEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl FromIterator<FileEvent> for EventBatch {
    fn from_iter<T: IntoIterator<Item = FileEvent>>(iter: T) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

/// Per-kind counts for a batch, emitted in tick traces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventBatchStats {
    /// Entries seen for the first time.
    pub created: usize,

    /// Entries whose timestamp changed.
    pub modified: usize,

    /// Entries that disappeared.
    pub deleted: usize,
}

impl EventBatchStats {
    /// Computes statistics for a batch of events.
    #[must_use]
    pub fn from_batch(batch: &EventBatch) -> Self {
        batch.iter().fold(Self::default(), |mut stats, event| {
            match event.kind {
                FileEventKind::Created => stats.created += 1,
                FileEventKind::Modified => stats.modified += 1,
                FileEventKind::Deleted => stats.deleted += 1,
                FileEventKind::Renamed | FileEventKind::Accessed => {}
            }
            stats
        })
    }
}
