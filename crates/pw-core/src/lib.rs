//! Core types, errors, and configuration for pollwatch.
//!
//! This crate provides the foundational types shared across the workspace:
//!
//! - [`FileEventKind`] - the categories of change a watcher can report
//! - [`RootState`] - lifecycle state of a watched root
//! - [`WatcherConfig`] - polling, pause, logging, and filter settings
//! - [`ConfigError`] - configuration loading and validation failures

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

pub use config::WatcherConfig;
pub use error::ConfigError;
pub use types::{FileEventKind, ParseKindError, RootState};
