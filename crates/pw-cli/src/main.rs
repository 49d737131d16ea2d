//! Demo host for the pollwatch polling directory watcher.
//!
//! Watches one directory, reports events for one file inside it, and walks
//! through a fixed sequence of watch, pause and resume phases before
//! shutting down.
//!
//! # Usage
//!
//! ```bash
//! pollwatch [OPTIONS]
//!
//! # Watch ./watched_directory/example.txt for modifications
//! pollwatch
//!
//! # Any kind of change to notes.md, polled every 200ms
//! pollwatch --dir ./notes --file notes.md --interval-ms 200 --filter created --filter modified --filter deleted
//!
//! # Start from a JSON config, override the log path
//! pollwatch --config pollwatch.json --log /tmp/events.log
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use pw_core::{FileEventKind, WatcherConfig};
use pw_watcher::{FileEvent, PollWatcher};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

const DEFAULT_INTERVAL_MS: u64 = 500;
const DEFAULT_LOG_FILE: &str = "file_events.log";

/// Polls a directory and reports changes to one file inside it.
#[derive(Parser, Debug)]
#[command(name = "pollwatch", version, about, long_about = None)]
struct Cli {
    /// Directory to watch.
    #[arg(short, long, default_value = "./watched_directory", env = "POLLWATCH_DIR")]
    dir: Utf8PathBuf,

    /// Name of the file inside the directory that receives a callback.
    #[arg(short, long, default_value = "example.txt")]
    file: String,

    /// Delay between polling ticks, in milliseconds.
    ///
    /// Overrides `poll_interval_ms` from `--config`. Defaults to 500.
    #[arg(short, long, env = "POLLWATCH_INTERVAL_MS")]
    interval_ms: Option<u64>,

    /// Append-only event log.
    ///
    /// Overrides `log_file` from `--config`. Defaults to `file_events.log`.
    #[arg(short, long, env = "POLLWATCH_LOG")]
    log: Option<Utf8PathBuf>,

    /// Event kinds reported to the callback (repeatable).
    ///
    /// Overrides `filter` from `--config`. Defaults to `modified`.
    #[arg(long, value_enum)]
    filter: Vec<KindArg>,

    /// Length of each watch phase, in seconds.
    #[arg(long, default_value_t = 10)]
    phase_secs: u64,

    /// Length of the pause between the two watch phases, in seconds.
    #[arg(long, default_value_t = 5)]
    pause_secs: u64,

    /// JSON watcher configuration to start from.
    #[arg(short, long, env = "POLLWATCH_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

/// Event kinds accepted by `--filter`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KindArg {
    /// New entries.
    Created,
    /// Entries whose modification time changed.
    Modified,
    /// Entries that disappeared.
    Deleted,
}

impl From<KindArg> for FileEventKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Created => Self::Created,
            KindArg::Modified => Self::Modified,
            KindArg::Deleted => Self::Deleted,
        }
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},mio=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Builds the watcher configuration from `--config` and the CLI flags.
///
/// Flags win over the file; the file wins over the built-in defaults.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded or the merged
/// configuration is invalid.
fn build_config(cli: &Cli) -> color_eyre::Result<WatcherConfig> {
    let mut config = match &cli.config {
        Some(path) => WatcherConfig::from_json_file(path)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config {}: {}", path, e))?,
        None => WatcherConfig {
            poll_interval_ms: DEFAULT_INTERVAL_MS,
            log_file: Some(Utf8PathBuf::from(DEFAULT_LOG_FILE)),
            filter: vec![FileEventKind::Modified],
            ..WatcherConfig::default()
        },
    };

    if let Some(interval_ms) = cli.interval_ms {
        config.poll_interval_ms = interval_ms;
    }
    if let Some(log) = &cli.log {
        config.log_file = Some(log.clone());
    }
    if !cli.filter.is_empty() {
        config.filter = cli.filter.iter().copied().map(FileEventKind::from).collect();
    }

    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration: {}", e))?;
    Ok(config)
}

/// Validates that the watched directory exists.
fn validate_dir(dir: &Utf8Path) -> color_eyre::Result<()> {
    if !dir.exists() {
        return Err(color_eyre::eyre::eyre!("Directory does not exist: {}", dir));
    }
    if !dir.is_dir() {
        return Err(color_eyre::eyre::eyre!("Path is not a directory: {}", dir));
    }
    Ok(())
}

// =============================================================================
// DEMO SEQUENCE
// =============================================================================

/// Reports one delivered event.
fn on_file_event(event: &FileEvent) {
    info!(kind = %event.kind, path = %event.path, "Event occurred");
}

/// Sleeps for `duration` unless interrupted.
///
/// Returns `false` if Ctrl-C arrived first.
async fn phase(label: &str, duration: Duration) -> bool {
    info!(phase = label, duration = ?duration, "Waiting");
    tokio::select! {
        () = tokio::time::sleep(duration) => true,
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Interrupted, shutting down");
            false
        }
    }
}

/// Runs the watch, pause, resume sequence against one directory.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created, the log cannot be
/// opened, or the directory cannot be watched.
async fn run(cli: &Cli, config: WatcherConfig) -> color_eyre::Result<()> {
    let file_to_watch = cli.dir.join(&cli.file);

    // Logging, interval and filter are applied step by step below
    let base = WatcherConfig {
        log_file: None,
        ..config.clone()
    };
    let watcher = PollWatcher::new(&base)?;

    if let Some(log) = &config.log_file {
        watcher.enable_logging(log)?;
    }
    watcher.set_polling_interval(config.poll_interval())?;
    watcher.start_watching(&cli.dir)?;

    if let Err(e) = watcher.add_watcher(&file_to_watch, on_file_event) {
        warn!(path = %file_to_watch, error = %e, "No callback registered");
    }
    watcher.set_event_filter(config.filter.iter().copied());

    let phase_len = Duration::from_secs(cli.phase_secs);
    let mut completed = phase("watch", phase_len).await;

    if completed {
        watcher.pause_monitoring();
        completed = phase("paused", Duration::from_secs(cli.pause_secs)).await;
        watcher.resume_monitoring();
    }

    if completed {
        phase("watch", phase_len).await;
    }

    if let Err(e) = watcher.remove_watcher(&file_to_watch) {
        warn!(path = %file_to_watch, error = %e, "Callback was not registered");
    }
    watcher.stop_watching(&cli.dir)?;
    watcher.shutdown().await;

    info!("Done");
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Merge config and flags, then run
    let config = build_config(&cli)?;
    validate_dir(&cli.dir)?;
    run(&cli, config).await
}
