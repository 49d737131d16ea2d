//! Watched root lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The lifecycle state of a watched root.
///
/// `Running` and `Paused` alternate under the global pause control;
/// `Stopped` is terminal.
///
/// # Examples
///
/// ```
/// use pw_core::RootState;
///
/// assert!(RootState::Running.is_active());
/// assert!(RootState::Paused.is_active());
/// assert!(!RootState::Stopped.is_active());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootState {
    /// The root is polled every interval.
    #[default]
    Running,

    /// Polling is suspended; the root idles until resumed.
    Paused,

    /// The polling cycle has been cancelled.
    Stopped,
}

impl RootState {
    /// Returns `true` if the root still has a live polling cycle.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl fmt::Display for RootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        })
    }
}
