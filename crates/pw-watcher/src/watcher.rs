//! Polling watcher facade and per-root polling cycles.
//!
//! This module provides the [`PollWatcher`] type that owns the registry and
//! control plane and runs one polling cycle per watched root.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                 Async Runtime (tokio), one task per root           │
//! │  ┌────────────────┐   paused?   ┌──────────────────────────────┐   │
//! │  │ run_cycle      │ ──────────► │ sleep(paused_poll) / cancel  │   │
//! │  │ (cancel token) │             └──────────────────────────────┘   │
//! │  └───────┬────────┘                                                │
//! │          │ spawn_blocking, awaited                                 │
//! │          ▼                                                         │
//! │  ┌────────────────┐    ┌────────────────┐    ┌─────────────────┐   │
//! │  │ Snapshot::scan │ -> │ dispatch       │ -> │ Callback + log  │   │
//! │  │ (read_dir diff)│    │ (route+filter) │    │ (same thread)   │   │
//! │  └────────────────┘    └────────────────┘    └─────────────────┘   │
//! │          │                                                         │
//! │          ▼                                                         │
//! │  sleep(interval) / cancel                                          │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ticks of one root never overlap, so its callbacks see events in order.
//! Different roots tick concurrently.
//!
//! # Usage
//!
//! ```no_run
//! use pw_watcher::PollWatcher;
//! use pw_core::{FileEventKind, WatcherConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let watcher = PollWatcher::new(&WatcherConfig::default())?;
//!     watcher.set_polling_interval(Duration::from_millis(500))?;
//!     watcher.start_watching("./watched_directory")?;
//!     watcher.add_watcher("./watched_directory/example.txt", |event| {
//!         tracing::info!(kind = %event.kind, path = %event.path, "Event occurred");
//!     })?;
//!     watcher.set_event_filter([FileEventKind::Modified]);
//!
//!     tokio::time::sleep(Duration::from_secs(10)).await;
//!     watcher.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::{Mutex, RwLock};
use pw_core::{FileEventKind, RootState, WatcherConfig};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::control::ControlPlane;
use crate::dispatch;
use crate::error::WatchError;
use crate::events::{EventBatchStats, FileEvent};
use crate::filter::EventFilter;
use crate::registry::{Callback, Registry, WatchedRoot};
use crate::snapshot::Snapshot;

/// State shared between the facade and every polling cycle.
struct Shared {
    registry: RwLock<Registry>,
    control: ControlPlane,
}

/// A polling directory watcher with per-path callbacks.
///
/// # Lifecycle
///
/// 1. **Creation**: [`PollWatcher::new`] captures the current tokio runtime
///    and applies the interval and logging settings of a [`WatcherConfig`].
///
/// 2. **Watching**: [`start_watching`](Self::start_watching) spawns one
///    polling cycle per root; [`add_watcher`](Self::add_watcher) attaches
///    callbacks to exact entry paths.
///
/// 3. **Shutdown**: [`stop_watching`](Self::stop_watching) cancels one root,
///    [`shutdown`](Self::shutdown) cancels all of them and awaits their
///    tasks. Dropping the watcher cancels every cycle without waiting.
///
/// # Thread Safety
///
/// All operations take `&self` and may be called from any thread, including
/// from inside a callback.
pub struct PollWatcher {
    shared: Arc<Shared>,
    runtime: Handle,
}

impl std::fmt::Debug for PollWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollWatcher")
            .field("roots", &self.active_watchers())
            .field("paused", &self.is_paused())
            .field("interval", &self.polling_interval())
            .finish_non_exhaustive()
    }
}

impl PollWatcher {
    /// Creates a watcher bound to the current tokio runtime.
    ///
    /// The config's `filter` is not applied here: filters attach to roots,
    /// and a new watcher has none.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::NoRuntime`] outside of a tokio runtime,
    /// [`WatchError::Config`] for an invalid config, and
    /// [`WatchError::LogOpen`] if the configured log cannot be opened.
    pub fn new(config: &WatcherConfig) -> Result<Self, WatchError> {
        let runtime = Handle::try_current().map_err(|_| WatchError::NoRuntime)?;
        Self::with_handle(config, runtime)
    }

    /// Creates a watcher whose polling cycles run on `runtime`.
    ///
    /// # Errors
    ///
    /// Same as [`PollWatcher::new`], minus [`WatchError::NoRuntime`].
    pub fn with_handle(config: &WatcherConfig, runtime: Handle) -> Result<Self, WatchError> {
        config.validate()?;
        let control = ControlPlane::new(config.poll_interval(), config.paused_poll())?;
        if let Some(log_file) = &config.log_file {
            control.enable_logging(log_file)?;
        }

        Ok(Self {
            shared: Arc::new(Shared {
                registry: RwLock::new(Registry::new()),
                control,
            }),
            runtime,
        })
    }

    // -------------------------------------------------------------------------
    // Watch registry
    // -------------------------------------------------------------------------

    /// Starts polling the immediate children of `path`.
    ///
    /// Returns as soon as the cycle is spawned. The path is stored as given;
    /// event paths are `path` joined with each entry name.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::PathNotFound`] if the path does not exist,
    /// [`WatchError::NotADirectory`] if it is not a directory, and
    /// [`WatchError::AlreadyWatching`] if it is already registered.
    pub fn start_watching(&self, path: impl AsRef<Utf8Path>) -> Result<(), WatchError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WatchError::path_not_found(path));
        }
        if !path.is_dir() {
            return Err(WatchError::NotADirectory(path.to_owned()));
        }

        let mut registry = self.shared.registry.write();
        let root = WatchedRoot::new(path.to_owned());
        let token = root.token.clone();
        let snapshot = Arc::clone(&root.snapshot);
        registry.insert_root(root)?;

        let task = self.runtime.spawn(run_cycle(
            Arc::clone(&self.shared),
            path.to_owned(),
            snapshot,
            token,
        ));
        registry.attach_task(path, task);

        tracing::info!(path = %path, "Started watching");
        Ok(())
    }

    /// Stops polling `path`.
    ///
    /// The cycle terminates at its next iteration boundary. The root's
    /// filter and every callback registered at or beneath `path` are
    /// removed immediately.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::NotWatching`] if `path` is not registered.
    pub fn stop_watching(&self, path: impl AsRef<Utf8Path>) -> Result<(), WatchError> {
        let path = path.as_ref();
        let root = self.shared.registry.write().remove_root(path)?;
        root.cancel();
        tracing::info!(path = %path, "Stopped watching");
        Ok(())
    }

    /// Registers `callback` for events on exactly `path`, replacing any
    /// earlier callback for it.
    ///
    /// The enclosing root does not need to be watched yet.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::PathNotFound`] if `path` does not exist now.
    pub fn add_watcher<F>(&self, path: impl AsRef<Utf8Path>, callback: F) -> Result<(), WatchError>
    where
        F: Fn(&FileEvent) + Send + Sync + 'static,
    {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WatchError::path_not_found(path));
        }

        let callback: Callback = Arc::new(callback);
        let replaced = self
            .shared
            .registry
            .write()
            .set_callback(path.to_owned(), callback);
        tracing::debug!(path = %path, replaced, "Callback registered");
        Ok(())
    }

    /// Removes the callback registered for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::NoCallback`] if none is registered.
    pub fn remove_watcher(&self, path: impl AsRef<Utf8Path>) -> Result<(), WatchError> {
        let path = path.as_ref();
        self.shared.registry.write().remove_callback(path)?;
        tracing::debug!(path = %path, "Callback removed");
        Ok(())
    }

    /// Applies a filter to every root registered right now.
    ///
    /// Roots started later are unfiltered until a filter is applied to them.
    /// An empty set of kinds removes the restriction.
    pub fn set_event_filter(&self, kinds: impl IntoIterator<Item = FileEventKind>) {
        let filter = EventFilter::new(kinds);
        let mut registry = self.shared.registry.write();
        registry.set_filter_for_all(&filter);
        tracing::debug!(kinds = ?filter.kinds(), roots = registry.root_paths().len(), "Event filter applied");
    }

    /// Applies a filter to one registered root.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::NotWatching`] if `root` is not registered.
    pub fn set_root_filter(
        &self,
        root: impl AsRef<Utf8Path>,
        kinds: impl IntoIterator<Item = FileEventKind>,
    ) -> Result<(), WatchError> {
        self.shared
            .registry
            .write()
            .set_filter(root.as_ref(), EventFilter::new(kinds))
    }

    /// Returns the watched roots in the order they were started.
    #[must_use]
    pub fn active_watchers(&self) -> Vec<Utf8PathBuf> {
        self.shared.registry.read().root_paths()
    }

    /// Returns `true` if `path` is a watched root.
    #[must_use]
    pub fn is_watching(&self, path: impl AsRef<Utf8Path>) -> bool {
        self.shared.registry.read().contains_root(path.as_ref())
    }

    /// Returns the lifecycle state of `path`.
    ///
    /// Unregistered paths report [`RootState::Stopped`].
    #[must_use]
    pub fn root_state(&self, path: impl AsRef<Utf8Path>) -> RootState {
        if !self.is_watching(path) {
            RootState::Stopped
        } else if self.is_paused() {
            RootState::Paused
        } else {
            RootState::Running
        }
    }

    /// Returns the entries currently tracked for `root`, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::NotWatching`] if `root` is not registered.
    pub fn tracked_entries(
        &self,
        root: impl AsRef<Utf8Path>,
    ) -> Result<Vec<(Utf8PathBuf, SystemTime)>, WatchError> {
        let root = root.as_ref();
        let snapshot = self
            .shared
            .registry
            .read()
            .snapshot_of(root)
            .ok_or_else(|| WatchError::NotWatching(root.to_owned()))?;
        let entries = snapshot.lock().entries();
        Ok(entries)
    }

    // -------------------------------------------------------------------------
    // Control plane
    // -------------------------------------------------------------------------

    /// Suspends polling on every root.
    pub fn pause_monitoring(&self) {
        self.shared.control.pause();
        tracing::info!("Monitoring paused");
    }

    /// Resumes polling on every root.
    pub fn resume_monitoring(&self) {
        self.shared.control.resume();
        tracing::info!("Monitoring resumed");
    }

    /// Returns `true` while monitoring is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.shared.control.is_paused()
    }

    /// Sets the delay between ticks for running and future cycles.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::InvalidInterval`] for a zero duration.
    pub fn set_polling_interval(&self, interval: Duration) -> Result<(), WatchError> {
        self.shared.control.set_interval(interval)?;
        tracing::info!(interval = ?interval, "Polling interval set");
        Ok(())
    }

    /// Returns the delay between ticks.
    #[must_use]
    pub fn polling_interval(&self) -> Duration {
        self.shared.control.interval()
    }

    /// Appends a line per delivered event to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::LogOpen`] if the file cannot be opened; the
    /// previous logging state is kept.
    pub fn enable_logging(&self, path: impl AsRef<Utf8Path>) -> Result<(), WatchError> {
        let path = path.as_ref();
        self.shared.control.enable_logging(path)?;
        tracing::info!(path = %path, "Logging enabled");
        Ok(())
    }

    /// Closes the event log, if any.
    pub fn disable_logging(&self) {
        self.shared.control.disable_logging();
    }

    /// Returns `true` if an event log is open.
    #[must_use]
    pub fn is_logging(&self) -> bool {
        self.shared.control.is_logging()
    }

    // -------------------------------------------------------------------------
    // Shutdown
    // -------------------------------------------------------------------------

    /// Stops every root without waiting for the cycles to finish.
    pub fn stop_all(&self) {
        let roots = self.shared.registry.write().drain_roots();
        for root in &roots {
            root.cancel();
            tracing::info!(path = %root.path, "Stopped watching");
        }
    }

    /// Stops every root and waits for all polling cycles to finish.
    pub async fn shutdown(self) {
        let roots = self.shared.registry.write().drain_roots();
        for root in &roots {
            root.cancel();
        }
        for root in roots {
            if let Some(task) = root.task {
                if let Err(error) = task.await {
                    tracing::error!(path = %root.path, error = %error, "Polling cycle failed");
                }
            }
        }
    }
}

impl Drop for PollWatcher {
    fn drop(&mut self) {
        // Cycles hold their own Arc to the shared state; cancel them so they
        // exit instead of polling forever.
        for root in self.shared.registry.write().drain_roots() {
            root.cancel();
        }
    }
}

/// Runs the polling loop for one root until its token is cancelled.
async fn run_cycle(
    shared: Arc<Shared>,
    root: Utf8PathBuf,
    snapshot: Arc<Mutex<Snapshot>>,
    token: CancellationToken,
) {
    tracing::debug!(path = %root, "Polling cycle started");

    while !token.is_cancelled() {
        if shared.control.is_paused() {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                () = tokio::time::sleep(shared.control.paused_poll()) => continue,
            }
        }

        let tick_shared = Arc::clone(&shared);
        let tick_root = root.clone();
        let tick_snapshot = Arc::clone(&snapshot);
        let tick_token = token.clone();
        let tick = tokio::task::spawn_blocking(move || {
            run_tick(&tick_shared, &tick_root, &tick_snapshot, &tick_token);
        });
        if let Err(error) = tick.await {
            tracing::error!(path = %root, error = %error, "Polling tick panicked");
        }

        tokio::select! {
            biased;
            () = token.cancelled() => break,
            () = tokio::time::sleep(shared.control.interval()) => {}
        }
    }

    tracing::debug!(path = %root, "Polling cycle stopped");
}

/// Scans `root` once and dispatches the resulting events in order.
fn run_tick(shared: &Shared, root: &Utf8Path, snapshot: &Mutex<Snapshot>, token: &CancellationToken) {
    let batch = match snapshot.lock().scan(root) {
        Ok(batch) => batch,
        Err(error) => {
            tracing::warn!(path = %root, error = %error, "Skipping tick, root could not be read");
            return;
        }
    };

    if batch.is_empty() {
        tracing::trace!(path = %root, "No changes");
        return;
    }

    let stats = EventBatchStats::from_batch(&batch);
    tracing::debug!(
        path = %root,
        created = stats.created,
        modified = stats.modified,
        deleted = stats.deleted,
        "Tick classified changes"
    );

    for event in &batch {
        if token.is_cancelled() {
            break;
        }
        tracing::info!(kind = %event.kind, path = %event.path, "File event");
        let outcome = dispatch::dispatch(&shared.registry, &shared.control, root, event);
        tracing::trace!(path = %event.path, ?outcome, "Dispatched");
    }
}
