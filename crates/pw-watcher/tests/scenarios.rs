//! End-to-end polling scenarios against real temporary directories.

use std::fs::{self, File};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use pw_core::{FileEventKind, WatcherConfig};
use pw_watcher::{FileEvent, PollWatcher};
use tempfile::TempDir;

const TICK: Duration = Duration::from_millis(20);
const WAIT_LIMIT: Duration = Duration::from_secs(5);

type Received = Arc<Mutex<Vec<FileEvent>>>;

fn create_temp_root() -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("Invalid path");
    (dir, root)
}

fn fast_watcher() -> PollWatcher {
    let config = WatcherConfig {
        poll_interval_ms: 20,
        paused_poll_ms: 10,
        ..WatcherConfig::default()
    };
    PollWatcher::new(&config).expect("Failed to create watcher")
}

/// Sets an explicit mtime so modifications never collide with the previous
/// timestamp on coarse-grained filesystems.
fn set_mtime(path: &Utf8Path, offset_secs: u64) {
    let file = File::options()
        .write(true)
        .open(path)
        .expect("Failed to open file");
    let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + offset_secs);
    file.set_modified(time).expect("Failed to set mtime");
}

fn recorder(watcher: &PollWatcher, path: &Utf8Path) -> Received {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    watcher
        .add_watcher(path, move |event| sink.lock().push(event.clone()))
        .expect("Failed to add watcher");
    received
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(TICK / 2).await;
    }
    condition()
}

fn is_tracked(watcher: &PollWatcher, root: &Utf8Path, path: &Utf8Path) -> bool {
    watcher
        .tracked_entries(root)
        .expect("Root should be watched")
        .iter()
        .any(|(tracked, _)| tracked == path)
}

fn kinds(received: &Received) -> Vec<FileEventKind> {
    received.lock().iter().map(|e| e.kind).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_create_modify_delete_lifecycle() {
    let (_dir, root) = create_temp_root();
    let (_staging_dir, staging) = create_temp_root();
    let file = root.join("a.txt");

    let watcher = fast_watcher();
    watcher
        .set_polling_interval(Duration::from_millis(100))
        .expect("Valid interval");
    watcher.start_watching(&root).expect("Failed to start");

    // First tick sees an empty root
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(
        watcher
            .tracked_entries(&root)
            .expect("Root should be watched")
            .is_empty()
    );

    // Stamp outside the root, then move in so no tick sees a partial write
    let staged = staging.join("a.txt");
    fs::write(&staged, "v1").expect("Failed to write file");
    set_mtime(&staged, 0);
    fs::rename(&staged, &file).expect("Failed to move file into root");
    assert!(wait_until(|| is_tracked(&watcher, &root, &file)).await);

    let received = recorder(&watcher, &file);
    set_mtime(&file, 10);
    assert!(wait_until(|| !received.lock().is_empty()).await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        *received.lock(),
        vec![FileEvent::new(file.clone(), FileEventKind::Modified)]
    );

    fs::remove_file(&file).expect("Failed to remove file");
    assert!(wait_until(|| received.lock().len() == 2).await);
    assert_eq!(
        kinds(&received),
        vec![FileEventKind::Modified, FileEventKind::Deleted]
    );
    assert!(!is_tracked(&watcher, &root, &file));

    watcher.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unchanged_entry_produces_no_repeat_events() {
    let (_dir, root) = create_temp_root();
    let file = root.join("steady.txt");
    fs::write(&file, "same").expect("Failed to write file");

    let watcher = fast_watcher();
    let received = recorder(&watcher, &file);
    watcher.start_watching(&root).expect("Failed to start");

    assert!(wait_until(|| !received.lock().is_empty()).await);
    tokio::time::sleep(TICK * 10).await;
    assert_eq!(kinds(&received), vec![FileEventKind::Created]);

    watcher.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_filter_suppresses_callback_but_snapshot_advances() {
    let (_dir, root) = create_temp_root();
    let file = root.join("filtered.txt");

    fs::write(&file, "v1").expect("Failed to write file");
    set_mtime(&file, 0);

    // Hold the first tick until the filter is in place
    let watcher = fast_watcher();
    watcher.pause_monitoring();
    watcher.start_watching(&root).expect("Failed to start");
    watcher.set_event_filter([FileEventKind::Modified]);
    let received = recorder(&watcher, &file);
    watcher.resume_monitoring();

    assert!(wait_until(|| is_tracked(&watcher, &root, &file)).await);
    tokio::time::sleep(TICK * 3).await;
    assert!(received.lock().is_empty());

    set_mtime(&file, 20);
    assert!(wait_until(|| !received.lock().is_empty()).await);
    assert_eq!(kinds(&received), vec![FileEventKind::Modified]);

    watcher.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_filter_does_not_cover_roots_started_later() {
    let (_dir1, root1) = create_temp_root();
    let (_dir2, root2) = create_temp_root();
    let file = root2.join("late.txt");
    fs::write(&file, "v1").expect("Failed to write file");
    set_mtime(&file, 0);

    let watcher = fast_watcher();
    watcher.start_watching(&root1).expect("Failed to start");
    watcher.set_event_filter([FileEventKind::Created]);
    watcher.start_watching(&root2).expect("Failed to start");

    assert!(wait_until(|| is_tracked(&watcher, &root2, &file)).await);
    let received = recorder(&watcher, &file);

    set_mtime(&file, 30);
    assert!(wait_until(|| kinds(&received).contains(&FileEventKind::Modified)).await);

    watcher.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pause_nets_changes_against_baseline() {
    let (_dir, root) = create_temp_root();
    let kept = root.join("kept.txt");
    let ghost = root.join("ghost.txt");
    fs::write(&kept, "v1").expect("Failed to write file");
    set_mtime(&kept, 0);

    let watcher = fast_watcher();
    watcher.start_watching(&root).expect("Failed to start");
    assert!(wait_until(|| is_tracked(&watcher, &root, &kept)).await);
    let kept_events = recorder(&watcher, &kept);

    watcher.pause_monitoring();
    // Let any tick that started before the pause finish
    tokio::time::sleep(TICK * 5).await;
    let baseline = watcher.tracked_entries(&root).expect("Root should be watched");

    fs::write(&ghost, "boo").expect("Failed to write file");
    let ghost_events = recorder(&watcher, &ghost);
    fs::remove_file(&ghost).expect("Failed to remove file");
    set_mtime(&kept, 40);
    set_mtime(&kept, 50);

    tokio::time::sleep(TICK * 5).await;
    assert!(kept_events.lock().is_empty());
    assert_eq!(
        watcher.tracked_entries(&root).expect("Root should be watched"),
        baseline
    );

    watcher.resume_monitoring();
    assert!(wait_until(|| !kept_events.lock().is_empty()).await);
    tokio::time::sleep(TICK * 5).await;

    assert_eq!(kinds(&kept_events), vec![FileEventKind::Modified]);
    assert!(ghost_events.lock().is_empty());
    assert!(!is_tracked(&watcher, &root, &ghost));

    watcher.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_watching_drops_callbacks_and_halts_polling() {
    let (_dir, root) = create_temp_root();
    let file = root.join("a.txt");
    fs::write(&file, "v1").expect("Failed to write file");
    set_mtime(&file, 0);

    let watcher = fast_watcher();
    let received = recorder(&watcher, &file);
    watcher.start_watching(&root).expect("Failed to start");
    assert!(wait_until(|| !received.lock().is_empty()).await);

    watcher.stop_watching(&root).expect("Failed to stop");
    assert!(watcher.remove_watcher(&file).is_err());

    // Let a tick that was already running finish
    tokio::time::sleep(TICK * 2).await;

    // A fresh callback under the stopped root must stay silent
    let after_stop = recorder(&watcher, &file);
    set_mtime(&file, 60);
    tokio::time::sleep(TICK * 10).await;

    assert!(after_stop.lock().is_empty());
    assert_eq!(kinds(&received), vec![FileEventKind::Created]);
    assert!(watcher.active_watchers().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delivered_events_are_logged() {
    let (_dir, root) = create_temp_root();
    let (_log_dir, log_root) = create_temp_root();
    let log_path = log_root.join("file_events.log");
    let watched = root.join("watched.txt");
    let unwatched = root.join("unwatched.txt");
    fs::write(&watched, "w").expect("Failed to write file");

    let watcher = fast_watcher();
    watcher.enable_logging(&log_path).expect("Failed to enable logging");
    let received = recorder(&watcher, &watched);
    watcher.start_watching(&root).expect("Failed to start");
    fs::write(&unwatched, "u").expect("Failed to write file");

    assert!(wait_until(|| !received.lock().is_empty()).await);
    assert!(wait_until(|| is_tracked(&watcher, &root, &unwatched)).await);
    watcher.shutdown().await;

    let contents = fs::read_to_string(&log_path).expect("Failed to read log");
    assert_eq!(contents, format!("Event: Created, File: {watched}\n"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_log_open_keeps_logging_disabled() {
    let watcher = fast_watcher();
    let result = watcher.enable_logging("/nonexistent/dir/file_events.log");
    assert!(result.is_err());
    assert!(!watcher.is_logging());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_active_watchers_in_insertion_order() {
    let (_dir_a, a) = create_temp_root();
    let (_dir_b, b) = create_temp_root();
    let (_dir_c, c) = create_temp_root();

    let watcher = fast_watcher();
    for root in [&b, &c, &a] {
        watcher.start_watching(root).expect("Failed to start");
    }
    assert_eq!(watcher.active_watchers(), vec![b.clone(), c.clone(), a.clone()]);

    watcher.stop_watching(&c).expect("Failed to stop");
    assert_eq!(watcher.active_watchers(), vec![b, a]);

    watcher.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_vanished_root_does_not_kill_cycle() {
    let (dir, root) = create_temp_root();
    let watcher = fast_watcher();
    watcher.start_watching(&root).expect("Failed to start");
    tokio::time::sleep(TICK * 2).await;

    drop(dir);
    tokio::time::sleep(TICK * 5).await;
    assert!(watcher.is_watching(&root));

    fs::create_dir(&root).expect("Failed to recreate root");
    let file = root.join("back.txt");
    fs::write(&file, "again").expect("Failed to write file");
    assert!(wait_until(|| is_tracked(&watcher, &root, &file)).await);

    watcher.shutdown().await;
    fs::remove_dir_all(&root).expect("Failed to clean up root");
}
