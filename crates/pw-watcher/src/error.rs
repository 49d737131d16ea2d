//! Error types for the pw-watcher crate.
//!
//! This module provides the [`WatchError`] type for every failure a
//! [`PollWatcher`](crate::PollWatcher) operation can report. Each variant
//! leaves the watcher's state exactly as it was before the call.

use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use pw_core::ConfigError;

/// Errors that can occur during watching operations.
///
/// # Error Recovery Strategy
///
/// - **Caller errors** ([`PathNotFound`], [`NotADirectory`],
///   [`AlreadyWatching`], [`NotWatching`], [`NoCallback`],
///   [`InvalidInterval`], [`LogOpen`]): the operation was a no-op; fix the
///   arguments and retry.
/// - **Setup errors** ([`NoRuntime`], [`Config`]): no watcher was built.
/// - **Per-tick errors** ([`NonUtf8Path`], [`Io`]): logged by the polling
///   cycle, which skips the affected entry or tick and keeps running.
///
/// # Examples
///
/// ```
/// use pw_watcher::WatchError;
///
/// fn describe(err: &WatchError) -> &'static str {
///     match err {
///         WatchError::AlreadyWatching(_) => "already watched",
///         WatchError::NotWatching(_) => "not watched",
///         _ => "other",
///     }
/// }
/// ```
///
/// [`PathNotFound`]: WatchError::PathNotFound
/// [`NotADirectory`]: WatchError::NotADirectory
/// [`AlreadyWatching`]: WatchError::AlreadyWatching
/// [`NotWatching`]: WatchError::NotWatching
/// [`NoCallback`]: WatchError::NoCallback
/// [`InvalidInterval`]: WatchError::InvalidInterval
/// [`LogOpen`]: WatchError::LogOpen
/// [`NoRuntime`]: WatchError::NoRuntime
/// [`Config`]: WatchError::Config
/// [`NonUtf8Path`]: WatchError::NonUtf8Path
/// [`Io`]: WatchError::Io
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The specified path does not exist.
    #[error("path does not exist: {0}")]
    PathNotFound(Utf8PathBuf),

    /// The path exists but is not a directory, so it cannot be a watch root.
    #[error("path is not a directory: {0}")]
    NotADirectory(Utf8PathBuf),

    /// The root is already registered.
    #[error("already watching: {0}")]
    AlreadyWatching(Utf8PathBuf),

    /// The root is not registered.
    #[error("not watching: {0}")]
    NotWatching(Utf8PathBuf),

    /// No callback is registered for the path.
    #[error("no callback registered for: {0}")]
    NoCallback(Utf8PathBuf),

    /// The event log could not be opened for appending.
    #[error("failed to open log file {path}: {source}")]
    LogOpen {
        /// The log file path.
        path: Utf8PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    /// A polling interval of zero was requested.
    #[error("polling interval must be greater than zero, got {0:?}")]
    InvalidInterval(Duration),

    /// The watcher was created outside of a tokio runtime.
    #[error("no tokio runtime available to run polling cycles")]
    NoRuntime,

    /// The supplied configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A directory entry name is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(PathBuf),

    /// An I/O error occurred while reading a watched root.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Creates a new [`WatchError::PathNotFound`] error.
    #[inline]
    pub fn path_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Creates a new [`WatchError::NonUtf8Path`] error.
    #[inline]
    pub fn non_utf8_path(path: impl Into<PathBuf>) -> Self {
        Self::NonUtf8Path(path.into())
    }

    /// Creates a new [`WatchError::LogOpen`] error.
    #[inline]
    pub fn log_open(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::LogOpen {
            path: path.into(),
            source,
        }
    }
}
