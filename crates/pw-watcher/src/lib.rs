//! Polling directory watcher with filtered per-path callbacks.
//!
//! This crate detects creation, modification and deletion of the immediate
//! children of watched directories by periodically listing them and
//! comparing modification times, then hands matching events to callbacks
//! registered for exact paths.
//!
//! # Overview
//!
//! - **Watch registry**: roots are started and stopped independently;
//!   callbacks are keyed by exact entry path; filters by root.
//! - **Snapshot/diff**: each tick compares `read_dir` against the root's
//!   last-observed mtimes and classifies Created/Modified/Deleted.
//! - **Dispatch**: an event reaches its callback only if the owning root's
//!   filter is empty or names the event kind; delivered events are appended
//!   to the optional event log.
//! - **Control plane**: global pause/resume, polling interval and logging.
//!
//! # Architecture
//!
//! ```text
//! PollWatcher ──start_watching──► tokio task per root (CancellationToken)
//!      │                                │
//!      │                     spawn_blocking tick
//!      │                                ▼
//!      │                       Snapshot::scan ──► EventBatch
//!      │                                │
//!      ▼                                ▼
//! Registry (roots, callbacks, filters) ◄── dispatch ──► callback, EventLog
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use pw_watcher::PollWatcher;
//! use pw_core::{FileEventKind, WatcherConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), pw_watcher::WatchError> {
//! let watcher = PollWatcher::new(&WatcherConfig::default())?;
//! watcher.enable_logging("file_events.log")?;
//! watcher.start_watching("./watched_directory")?;
//! watcher.add_watcher("./watched_directory/example.txt", |event| {
//!     println!("{} {}", event.kind, event.path);
//! })?;
//! watcher.set_event_filter([FileEventKind::Modified]);
//!
//! watcher.pause_monitoring();
//! tokio::time::sleep(Duration::from_secs(5)).await;
//! watcher.resume_monitoring();
//!
//! watcher.stop_watching("./watched_directory")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Every operation reports failures through [`WatchError`]; a failed call
//! changes nothing. Errors met while polling (an unreadable entry, a root
//! that vanished) are logged with `tracing` and the cycle keeps running.
//!
//! # Performance Considerations
//!
//! - **Non-recursive**: one `read_dir` and one `metadata` call per child per
//!   tick.
//! - **Blocking work off the async workers**: ticks and callbacks run on
//!   tokio's blocking pool, one tick at a time per root.
//! - **Slow callbacks** stall only their own root's cycle.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod control;
mod dispatch;
pub mod error;
pub mod events;
pub mod filter;
pub mod log;
mod registry;
pub mod snapshot;
pub mod watcher;

// Re-export error types
pub use error::WatchError;

// Re-export event types
pub use events::{EventBatch, EventBatchStats, FileEvent};

// Re-export filter types
pub use filter::EventFilter;

// Re-export snapshot and registry types
pub use registry::Callback;
pub use snapshot::Snapshot;

// Re-export watcher types
pub use watcher::PollWatcher;
