//! Event-kind filtering for watched roots.
//!
//! Each watched root may carry an [`EventFilter`] naming the event kinds its
//! callbacks receive. An empty filter accepts every kind, which is also the
//! state of a root that never had a filter applied.
//!
//! # Examples
//!
//! ```
//! use pw_watcher::EventFilter;
//! use pw_core::FileEventKind;
//!
//! let filter = EventFilter::new([FileEventKind::Modified]);
//! assert!(filter.accepts(FileEventKind::Modified));
//! assert!(!filter.accepts(FileEventKind::Created));
//!
//! // Empty filters are unrestricted
//! assert!(EventFilter::accept_all().accepts(FileEventKind::Deleted));
//! ```

use pw_core::FileEventKind;
use smallvec::SmallVec;

/// The set of event kinds a root forwards to its callbacks.
///
/// Kinds are kept deduplicated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    kinds: SmallVec<[FileEventKind; 4]>,
}

impl EventFilter {
    /// Creates a filter accepting exactly the given kinds.
    ///
    /// Passing no kinds yields an unrestricted filter.
    #[must_use]
    pub fn new(kinds: impl IntoIterator<Item = FileEventKind>) -> Self {
        let mut filter = Self::accept_all();
        for kind in kinds {
            if !filter.kinds.contains(&kind) {
                filter.kinds.push(kind);
            }
        }
        filter
    }

    /// Creates an unrestricted filter.
    #[inline]
    #[must_use]
    pub fn accept_all() -> Self {
        Self {
            kinds: SmallVec::new(),
        }
    }

    /// Returns `true` if events of `kind` pass this filter.
    #[inline]
    #[must_use]
    pub fn accepts(&self, kind: FileEventKind) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }

    /// Returns the accepted kinds.
    #[inline]
    #[must_use]
    pub fn kinds(&self) -> &[FileEventKind] {
        &self.kinds
    }
}

impl FromIterator<FileEventKind> for EventFilter {
    fn from_iter<T: IntoIterator<Item = FileEventKind>>(iter: T) -> Self {
        Self::new(iter)
    }
}
