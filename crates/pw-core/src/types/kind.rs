//! File event categories.
//!
//! This module provides the [`FileEventKind`] enum describing what happened
//! to a watched entry between two polling ticks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of change observed for a directory entry.
///
/// The polling diff only ever produces [`Created`](Self::Created),
/// [`Modified`](Self::Modified) and [`Deleted`](Self::Deleted). A rename is
/// observed as a `Deleted` for the old name plus an unrelated `Created` for
/// the new one. [`Renamed`](Self::Renamed) and [`Accessed`](Self::Accessed)
/// exist so that filters and callbacks can name them, but no tick emits them.
///
/// # Examples
///
/// ```
/// use pw_core::FileEventKind;
///
/// assert_eq!(FileEventKind::Modified.to_string(), "Modified");
/// assert_eq!("deleted".parse::<FileEventKind>(), Ok(FileEventKind::Deleted));
/// assert!(FileEventKind::Created.is_produced());
/// assert!(!FileEventKind::Accessed.is_produced());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEventKind {
    /// The entry appeared since the previous tick.
    Created,

    /// The entry's modification timestamp changed since the previous tick.
    Modified,

    /// The entry disappeared since the previous tick.
    Deleted,

    /// Declared for filters; never produced by polling.
    Renamed,

    /// Declared for filters; never produced by polling.
    Accessed,
}

impl FileEventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Created,
        Self::Modified,
        Self::Deleted,
        Self::Renamed,
        Self::Accessed,
    ];

    /// Returns the textual name used in log lines.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Modified => "Modified",
            Self::Deleted => "Deleted",
            Self::Renamed => "Renamed",
            Self::Accessed => "Accessed",
        }
    }

    /// Returns `true` if the polling diff can emit this kind.
    #[inline]
    #[must_use]
    pub const fn is_produced(self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Deleted)
    }
}

impl fmt::Display for FileEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`FileEventKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown file event kind '{0}'")]
pub struct ParseKindError(String);

impl FromStr for FileEventKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseKindError(s.to_owned()))
    }
}
