//! Watch registry: roots, callbacks, and per-root filters.
//!
//! The [`Registry`] holds three tables that share one lock in the watcher:
//!
//! - watched roots in insertion order, each with its cancellation token and
//!   snapshot
//! - callbacks keyed by exact entry path
//! - event filters keyed by root path
//!
//! Callbacks and roots are registered independently. Removing a root drops
//! its filter and every callback registered at or beneath it.

use std::fmt;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use pw_core::FileEventKind;
use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::WatchError;
use crate::events::FileEvent;
use crate::filter::EventFilter;
use crate::snapshot::Snapshot;

/// A callback invoked for accepted events on one exact path.
pub type Callback = Arc<dyn Fn(&FileEvent) + Send + Sync>;

/// A directory under active polling.
pub(crate) struct WatchedRoot {
    pub(crate) path: Utf8PathBuf,
    pub(crate) token: CancellationToken,
    pub(crate) snapshot: Arc<Mutex<Snapshot>>,
    pub(crate) task: Option<JoinHandle<()>>,
}

impl WatchedRoot {
    pub(crate) fn new(path: Utf8PathBuf) -> Self {
        Self {
            path,
            token: CancellationToken::new(),
            snapshot: Arc::new(Mutex::new(Snapshot::new())),
            task: None,
        }
    }

    /// Signals the polling cycle to stop at its next iteration boundary.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }
}

impl fmt::Debug for WatchedRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchedRoot")
            .field("path", &self.path)
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Result of looking up where an event should go.
pub(crate) enum Route {
    /// No callback is registered for the event's path.
    Unrouted,
    /// A callback exists but the root's filter rejects the kind.
    Filtered,
    /// The callback should be invoked.
    Deliver(Callback),
}

#[derive(Default)]
pub(crate) struct Registry {
    roots: Vec<WatchedRoot>,
    callbacks: FxHashMap<Utf8PathBuf, Callback>,
    filters: FxHashMap<Utf8PathBuf, EventFilter>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn contains_root(&self, path: &Utf8Path) -> bool {
        self.roots.iter().any(|root| root.path == path)
    }

    fn root(&self, path: &Utf8Path) -> Option<&WatchedRoot> {
        self.roots.iter().find(|root| root.path == path)
    }

    pub(crate) fn insert_root(&mut self, root: WatchedRoot) -> Result<(), WatchError> {
        if self.contains_root(&root.path) {
            return Err(WatchError::AlreadyWatching(root.path));
        }
        self.roots.push(root);
        Ok(())
    }

    /// Removes a root together with its filter and the callbacks beneath it.
    ///
    /// The returned root has not been cancelled yet.
    pub(crate) fn remove_root(&mut self, path: &Utf8Path) -> Result<WatchedRoot, WatchError> {
        let index = self
            .roots
            .iter()
            .position(|root| root.path == path)
            .ok_or_else(|| WatchError::NotWatching(path.to_owned()))?;

        let root = self.roots.remove(index);
        self.filters.remove(path);
        self.callbacks
            .retain(|callback_path, _| !callback_path.starts_with(path));
        Ok(root)
    }

    /// Removes every root, in insertion order.
    pub(crate) fn drain_roots(&mut self) -> Vec<WatchedRoot> {
        let roots: Vec<WatchedRoot> = self.roots.drain(..).collect();
        for root in &roots {
            self.filters.remove(&root.path);
            self.callbacks
                .retain(|callback_path, _| !callback_path.starts_with(&root.path));
        }
        roots
    }

    pub(crate) fn attach_task(&mut self, path: &Utf8Path, task: JoinHandle<()>) {
        if let Some(root) = self.roots.iter_mut().find(|root| root.path == path) {
            root.task = Some(task);
        }
    }

    pub(crate) fn root_paths(&self) -> Vec<Utf8PathBuf> {
        self.roots.iter().map(|root| root.path.clone()).collect()
    }

    pub(crate) fn snapshot_of(&self, path: &Utf8Path) -> Option<Arc<Mutex<Snapshot>>> {
        self.root(path).map(|root| Arc::clone(&root.snapshot))
    }

    /// Registers or replaces the callback for `path`.
    ///
    /// Returns `true` if an earlier callback was replaced.
    pub(crate) fn set_callback(&mut self, path: Utf8PathBuf, callback: Callback) -> bool {
        self.callbacks.insert(path, callback).is_some()
    }

    pub(crate) fn remove_callback(&mut self, path: &Utf8Path) -> Result<(), WatchError> {
        self.callbacks
            .remove(path)
            .map(drop)
            .ok_or_else(|| WatchError::NoCallback(path.to_owned()))
    }

    #[cfg(test)]
    pub(crate) fn has_callback(&self, path: &Utf8Path) -> bool {
        self.callbacks.contains_key(path)
    }

    /// Assigns `filter` to every currently registered root.
    pub(crate) fn set_filter_for_all(&mut self, filter: &EventFilter) {
        for root in &self.roots {
            self.filters.insert(root.path.clone(), filter.clone());
        }
    }

    pub(crate) fn set_filter(
        &mut self,
        path: &Utf8Path,
        filter: EventFilter,
    ) -> Result<(), WatchError> {
        if !self.contains_root(path) {
            return Err(WatchError::NotWatching(path.to_owned()));
        }
        self.filters.insert(path.to_owned(), filter);
        Ok(())
    }

    pub(crate) fn filter_for(&self, root: &Utf8Path) -> Option<&EventFilter> {
        self.filters.get(root)
    }

    /// Decides how an event observed under `root` is delivered.
    pub(crate) fn route(&self, root: &Utf8Path, path: &Utf8Path, kind: FileEventKind) -> Route {
        let Some(callback) = self.callbacks.get(path) else {
            return Route::Unrouted;
        };
        let accepted = self
            .filter_for(root)
            .is_none_or(|filter| filter.accepts(kind));
        if accepted {
            Route::Deliver(Arc::clone(callback))
        } else {
            Route::Filtered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Callback {
        Arc::new(|_event: &FileEvent| {})
    }

    fn registry_with_roots(paths: &[&str]) -> Registry {
        let mut registry = Registry::new();
        for path in paths {
            registry
                .insert_root(WatchedRoot::new(Utf8PathBuf::from(*path)))
                .expect("Insert failed");
        }
        registry
    }

    #[test]
    fn test_insert_root_rejects_duplicates() {
        let mut registry = registry_with_roots(&["/w"]);
        let result = registry.insert_root(WatchedRoot::new(Utf8PathBuf::from("/w")));
        assert!(matches!(result, Err(WatchError::AlreadyWatching(p)) if p == "/w"));
        assert_eq!(registry.root_paths().len(), 1);
    }

    #[test]
    fn test_root_paths_keep_insertion_order() {
        let registry = registry_with_roots(&["/z", "/a", "/m"]);
        let paths: Vec<_> = registry.root_paths().into_iter().map(String::from).collect();
        assert_eq!(paths, vec!["/z", "/a", "/m"]);
    }

    #[test]
    fn test_remove_root_cascades_to_filter_and_callbacks() {
        let mut registry = registry_with_roots(&["/w", "/other"]);
        registry.set_filter_for_all(&EventFilter::new([FileEventKind::Created]));
        registry.set_callback(Utf8PathBuf::from("/w/a.txt"), noop());
        registry.set_callback(Utf8PathBuf::from("/other/b.txt"), noop());
        registry.set_callback(Utf8PathBuf::from("/wx/c.txt"), noop());

        let removed = registry.remove_root(Utf8Path::new("/w")).expect("Remove failed");
        assert_eq!(removed.path, "/w");

        assert!(!registry.contains_root(Utf8Path::new("/w")));
        assert!(registry.filter_for(Utf8Path::new("/w")).is_none());
        assert!(!registry.has_callback(Utf8Path::new("/w/a.txt")));
        // Component-wise prefix: "/wx" is not beneath "/w"
        assert!(registry.has_callback(Utf8Path::new("/wx/c.txt")));
        assert!(registry.has_callback(Utf8Path::new("/other/b.txt")));
        assert!(registry.filter_for(Utf8Path::new("/other")).is_some());
    }

    #[test]
    fn test_remove_root_twice_is_not_watching() {
        let mut registry = registry_with_roots(&["/w"]);
        registry.remove_root(Utf8Path::new("/w")).expect("Remove failed");
        let second = registry.remove_root(Utf8Path::new("/w"));
        assert!(matches!(second, Err(WatchError::NotWatching(_))));
    }

    #[test]
    fn test_callback_overwrite_and_remove() {
        let mut registry = Registry::new();
        assert!(!registry.set_callback(Utf8PathBuf::from("/w/a"), noop()));
        assert!(registry.set_callback(Utf8PathBuf::from("/w/a"), noop()));

        registry
            .remove_callback(Utf8Path::new("/w/a"))
            .expect("Remove failed");
        assert!(matches!(
            registry.remove_callback(Utf8Path::new("/w/a")),
            Err(WatchError::NoCallback(_))
        ));
    }

    #[test]
    fn test_filter_for_all_is_a_snapshot_assignment() {
        let mut registry = registry_with_roots(&["/r1"]);
        registry.set_filter_for_all(&EventFilter::new([FileEventKind::Created]));
        registry
            .insert_root(WatchedRoot::new(Utf8PathBuf::from("/r2")))
            .expect("Insert failed");

        assert!(registry.filter_for(Utf8Path::new("/r1")).is_some());
        assert!(registry.filter_for(Utf8Path::new("/r2")).is_none());
    }

    #[test]
    fn test_set_filter_requires_registered_root() {
        let mut registry = registry_with_roots(&["/r1"]);
        let result = registry.set_filter(Utf8Path::new("/nope"), EventFilter::accept_all());
        assert!(matches!(result, Err(WatchError::NotWatching(_))));
        assert!(registry.filter_for(Utf8Path::new("/nope")).is_none());
    }

    #[test]
    fn test_route() {
        let mut registry = registry_with_roots(&["/w"]);
        let root = Utf8Path::new("/w");
        let file = Utf8Path::new("/w/a.txt");

        assert!(matches!(
            registry.route(root, file, FileEventKind::Created),
            Route::Unrouted
        ));

        registry.set_callback(file.to_owned(), noop());
        assert!(matches!(
            registry.route(root, file, FileEventKind::Created),
            Route::Deliver(_)
        ));

        registry
            .set_filter(root, EventFilter::new([FileEventKind::Modified]))
            .expect("Set filter failed");
        assert!(matches!(
            registry.route(root, file, FileEventKind::Created),
            Route::Filtered
        ));
        assert!(matches!(
            registry.route(root, file, FileEventKind::Modified),
            Route::Deliver(_)
        ));
    }

    #[test]
    fn test_drain_roots() {
        let mut registry = registry_with_roots(&["/a", "/b"]);
        registry.set_callback(Utf8PathBuf::from("/a/x"), noop());
        let drained = registry.drain_roots();
        assert_eq!(drained.len(), 2);
        assert!(registry.root_paths().is_empty());
        assert!(!registry.has_callback(Utf8Path::new("/a/x")));
    }
}
