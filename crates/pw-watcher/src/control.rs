//! Control plane shared by every polling cycle.
//!
//! Holds the global pause flag, the polling interval, the paused idle sleep
//! and the optional event log. Cycles read the flag and interval at the top
//! of each iteration, so updates become visible on the next iteration rather
//! than instantly.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use camino::Utf8Path;
use parking_lot::Mutex;

use crate::error::WatchError;
use crate::events::FileEvent;
use crate::log::EventLog;

pub(crate) struct ControlPlane {
    paused: AtomicBool,
    interval_nanos: AtomicU64,
    paused_poll: Duration,
    log: Mutex<Option<EventLog>>,
}

fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl ControlPlane {
    pub(crate) fn new(interval: Duration, paused_poll: Duration) -> Result<Self, WatchError> {
        if interval.is_zero() {
            return Err(WatchError::InvalidInterval(interval));
        }
        Ok(Self {
            paused: AtomicBool::new(false),
            interval_nanos: AtomicU64::new(duration_to_nanos(interval)),
            paused_poll,
            log: Mutex::new(None),
        })
    }

    pub(crate) fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    pub(crate) fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub(crate) fn set_interval(&self, interval: Duration) -> Result<(), WatchError> {
        if interval.is_zero() {
            return Err(WatchError::InvalidInterval(interval));
        }
        self.interval_nanos
            .store(duration_to_nanos(interval), Ordering::Release);
        Ok(())
    }

    pub(crate) fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_nanos.load(Ordering::Acquire))
    }

    pub(crate) const fn paused_poll(&self) -> Duration {
        self.paused_poll
    }

    /// Opens `path` as the new log sink, replacing any previous one.
    ///
    /// On failure the current sink, if any, stays in place.
    pub(crate) fn enable_logging(&self, path: &Utf8Path) -> Result<(), WatchError> {
        let log = EventLog::open(path).map_err(|source| WatchError::log_open(path, source))?;
        *self.log.lock() = Some(log);
        Ok(())
    }

    pub(crate) fn disable_logging(&self) {
        self.log.lock().take();
    }

    pub(crate) fn is_logging(&self) -> bool {
        self.log.lock().is_some()
    }

    /// Appends a line for `event` if logging is enabled.
    ///
    /// The sink lock serializes writers from concurrently dispatching roots.
    pub(crate) fn log_event(&self, event: &FileEvent) {
        let mut guard = self.log.lock();
        if let Some(log) = guard.as_mut() {
            if let Err(error) = log.append(event) {
                tracing::warn!(log = %log.path(), error = %error, "Failed to write event log line");
            }
        }
    }
}
