//! Configuration for the polling watcher.
//!
//! [`WatcherConfig`] collects the settings that the control plane applies to
//! a freshly built watcher: the polling interval, the idle sleep used while
//! paused, an optional event log, and an initial event filter.
//!
//! The type implements [`Default`] and is `#[serde(default)]`, so a JSON file
//! only needs to name the options it overrides.

use std::fs;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::FileEventKind;

/// Default delay between two polling ticks.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default idle sleep of a paused polling cycle.
pub const DEFAULT_PAUSED_POLL_MS: u64 = 1000;

/// Configuration for a polling watcher.
///
/// # Examples
///
/// ```
/// use pw_core::WatcherConfig;
/// use std::time::Duration;
///
/// let config = WatcherConfig::default();
/// assert_eq!(config.poll_interval(), Duration::from_secs(1));
/// assert!(config.log_file.is_none());
/// assert!(config.filter.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Delay between two ticks of every polling cycle, in milliseconds.
    pub poll_interval_ms: u64,

    /// Idle sleep of a paused cycle before it re-checks the pause flag.
    pub paused_poll_ms: u64,

    /// Append-only event log. `None` disables logging.
    pub log_file: Option<Utf8PathBuf>,

    /// Event kinds forwarded to callbacks. Empty accepts every kind.
    ///
    /// Filters attach to roots, so the host applies this once its roots
    /// are registered.
    pub filter: Vec<FileEventKind>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            paused_poll_ms: DEFAULT_PAUSED_POLL_MS,
            log_file: None,
            filter: Vec::new(),
        }
    }
}

impl WatcherConfig {
    /// Loads a configuration from a JSON file and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist,
    /// [`ConfigError::Parse`] for malformed JSON, and
    /// [`ConfigError::InvalidOption`] if validation fails.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_owned()));
        }
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every option holds a usable value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] when either interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid_option(
                "poll_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.paused_poll_ms == 0 {
            return Err(ConfigError::invalid_option(
                "paused_poll_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Returns the polling interval as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the paused idle sleep as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn paused_poll(&self) -> Duration {
        Duration::from_millis(self.paused_poll_ms)
    }
}
